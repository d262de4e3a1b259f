use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sm8_relay_types::{AttachmentMetadata, SignatureUploadRequest, SignatureUploadResponse};

use crate::config::RelayState;
use crate::error::RelayError;
use crate::signature::{decode_signature, format_limit, INVALID_SIGNATURE};

/// ServiceM8に登録する署名画像のMIMEタイプ
const SIGNATURE_MIME_TYPE: &str = "image/png";

const SUCCESS_MESSAGE: &str = "Signature file uploaded to ServiceM8 successfully.";

/// 署名アップロードハンドラ。全パス・全メソッドを受ける。
///
/// ボディの読み取り失敗（サイズ上限超過を含む）はメソッド判定の後に評価する。
/// OPTIONSと405はボディの内容に左右されない。
pub async fn handle_signature_upload(
    State(state): State<Arc<RelayState>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, RelayError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let body = body.map_err(|rejection| body_rejection(&state, rejection))?;
    let response = relay_signature(&state, &body).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// ボディ読み取りの失敗をリレーのエラーに変換する。
fn body_rejection(state: &RelayState, rejection: BytesRejection) -> RelayError {
    tracing::warn!("リクエストボディの読み取りに失敗: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::PayloadTooLarge(format_limit(state.config.max_signature_bytes))
    } else {
        RelayError::BadRequest("Invalid JSON request body.".to_string())
    }
}

/// JSONの `jobUUID` をジョブ識別子として取り出す。
///
/// 空文字列・0・false・null・配列・オブジェクトは欠落として扱う。
/// 数値と `true` は文字列化して受け付ける。
pub(crate) fn job_identifier(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        serde_json::Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// ジョブに対応する添付ファイル名
pub(crate) fn signature_filename(job_uuid: &str) -> String {
    format!("signature-{job_uuid}.png")
}

async fn relay_signature(
    state: &RelayState,
    body: &[u8],
) -> Result<SignatureUploadResponse, RelayError> {
    let request: SignatureUploadRequest = if body.is_empty() {
        SignatureUploadRequest::default()
    } else {
        serde_json::from_slice(body).map_err(|e| {
            tracing::warn!("リクエストボディのパースに失敗: {}", e);
            RelayError::BadRequest("Invalid JSON request body.".to_string())
        })?
    };

    let job_uuid = job_identifier(request.job_uuid)
        .ok_or_else(|| RelayError::BadRequest("Missing 'jobUUID' in request body.".to_string()))?;
    let signature = request
        .signature
        .ok_or_else(|| RelayError::BadRequest(INVALID_SIGNATURE.to_string()))?;

    let image = decode_signature(&signature, state.config.max_signature_bytes)?;

    // Step 1: 添付メタデータ登録
    let metadata = AttachmentMetadata {
        job_uuid: job_uuid.clone(),
        filename: signature_filename(&job_uuid),
        mime_type: SIGNATURE_MIME_TYPE.to_string(),
    };
    let attachment_uuid = state.servicem8.create_attachment(&metadata).await?;

    // Step 2: バイナリアップロード
    state
        .servicem8
        .upload_attachment_file(&attachment_uuid, &metadata.filename, &metadata.mime_type, image)
        .await?;

    tracing::info!(
        job_uuid = %job_uuid,
        attachment_uuid = %attachment_uuid,
        "署名ファイルをServiceM8にアップロードしました"
    );

    Ok(SignatureUploadResponse {
        success: true,
        message: SUCCESS_MESSAGE.to_string(),
    })
}
