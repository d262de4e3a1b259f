//! # SM8 署名リレー 共有型定義
//!
//! クライアント ⇔ リレー、リレー ⇔ ServiceM8 間でやり取りするJSON構造を
//! Rust構造体として提供する。
//!
//! ## エンコーディング規則
//! - 署名画像: `data:image/<subtype>;base64,<payload>` 形式のData URI
//! - ServiceM8 API: snake_case のフィールド名（`job_uuid` 等）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// クライアント ⇔ リレー
// ---------------------------------------------------------------------------

/// 署名アップロードリクエスト。
///
/// 必須チェックはハンドラ側で順序どおりに行うため、両フィールドとも
/// `Option` で受け取る（欠落をパースエラーにしない）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureUploadRequest {
    /// ServiceM8上のジョブUUID。数値で送られる場合もあるため型を固定しない。
    #[serde(rename = "jobUUID", default, skip_serializing_if = "Option::is_none")]
    pub job_uuid: Option<serde_json::Value>,
    /// Data URI形式の署名画像
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// 署名アップロード成功レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureUploadResponse {
    pub success: bool,
    pub message: String,
}

/// エラーレスポンス。ServiceM8の生のエラー本文は含めない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// リレー ⇔ ServiceM8
// ---------------------------------------------------------------------------

/// `POST /Attachment.json` のリクエストボディ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// 添付先ジョブのUUID
    pub job_uuid: String,
    /// 添付ファイル名（例: `signature-<jobUUID>.png`）
    pub filename: String,
    /// MIMEタイプ
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// `POST /Attachment.json` のレスポンスボディ。
///
/// ServiceM8は他のフィールドも返すが、後続のアップロードに必要なのは `uuid` のみ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentCreated {
    /// 作成された添付レコードのUUID
    pub uuid: String,
}
