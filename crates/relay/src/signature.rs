//! # 署名画像のデコード
//!
//! `data:image/<subtype>;base64,<payload>` 形式のData URIから画像バイナリを取り出す。
//! 画像内容そのものは検証せず、接頭辞とサイズのみを確認する。

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::RelayError;

/// 署名として受け付けるData URIの接頭辞
const IMAGE_DATA_URI_MARKER: &str = "data:image";

pub const INVALID_SIGNATURE: &str = "Invalid or missing 'signature' in base64 image format.";

/// Base64エンジン（Standard、パディング有無を問わない）
fn b64() -> GeneralPurpose {
    GeneralPurpose::new(
        &base64::alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
}

/// `data:image/<subtype>;base64,` の接頭辞を取り除く。
///
/// subtypeは英数字とアンダースコアのみ。形式に合わない場合は入力をそのまま返す。
fn strip_data_uri_prefix(data_uri: &str) -> &str {
    let Some(rest) = data_uri.strip_prefix("data:image/") else {
        return data_uri;
    };
    let Some((subtype, payload)) = rest.split_once(";base64,") else {
        return data_uri;
    };
    let valid_subtype = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_subtype {
        payload
    } else {
        data_uri
    }
}

/// Base64ペイロードを正規化する。
///
/// 空白・改行を取り除き、URL-safeアルファベット（`-` / `_`）を標準の `+` / `/` に置き換える。
/// 行折り返しやURL-safeでエンコードされた署名も受け付けるため。
fn normalize_payload(payload: &str) -> String {
    payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect()
}

/// 署名Data URIをデコードし、サイズ上限を確認する。
///
/// - `data:image` で始まらない、またはBase64として不正 → `BadRequest`
/// - デコード後のサイズが `max_bytes` を超える → `PayloadTooLarge`
pub fn decode_signature(data_uri: &str, max_bytes: usize) -> Result<Vec<u8>, RelayError> {
    if !data_uri.starts_with(IMAGE_DATA_URI_MARKER) {
        return Err(RelayError::BadRequest(INVALID_SIGNATURE.to_string()));
    }

    let payload = strip_data_uri_prefix(data_uri);
    let bytes = b64().decode(normalize_payload(payload)).map_err(|e| {
        tracing::warn!("署名のBase64デコードに失敗: {}", e);
        RelayError::BadRequest(INVALID_SIGNATURE.to_string())
    })?;

    if bytes.len() > max_bytes {
        return Err(RelayError::PayloadTooLarge(format_limit(max_bytes)));
    }

    Ok(bytes)
}

/// サイズ上限をエラーメッセージ用に整形する（例: 1048576 → "1MB"）。
pub(crate) fn format_limit(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    const KIB: usize = 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}
