//! # ServiceM8 APIクライアント
//!
//! 添付ファイルの2段階作成（メタデータ登録 → バイナリアップロード）を行う。
//! 全てのリクエストに静的APIキーを `X-Api-Key` ヘッダで付与する。
//! リトライ、タイムアウト上書き、失敗時のロールバックは行わない。

use axum::http::StatusCode;
use sm8_relay_types::{AttachmentCreated, AttachmentMetadata};

use crate::error::RelayError;

/// APIキーヘッダ名
const API_KEY_HEADER: &str = "X-Api-Key";

/// メタデータ登録失敗時のクライアント向けメッセージ
pub const METADATA_FAILED: &str = "Failed to create attachment metadata in ServiceM8.";

/// バイナリアップロード失敗時のクライアント向けメッセージ
pub const UPLOAD_FAILED: &str = "Failed to upload the signature file to ServiceM8.";

/// ServiceM8 APIクライアント。
pub struct ServiceM8Client {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ServiceM8Client {
    pub fn new(http_client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    /// `POST /Attachment.json` — 添付メタデータを登録し、添付UUIDを返す。
    pub async fn create_attachment(
        &self,
        metadata: &AttachmentMetadata,
    ) -> Result<String, RelayError> {
        let url = format!("{}/Attachment.json", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(metadata)
            .send()
            .await
            .map_err(|e| RelayError::Internal(format!("メタデータ登録の送信に失敗: {e}")))?;

        let response = check_status(response, "添付メタデータの登録に失敗", METADATA_FAILED).await?;

        let created: AttachmentCreated = response
            .json()
            .await
            .map_err(|e| RelayError::Internal(format!("メタデータ登録レスポンスのパースに失敗: {e}")))?;

        tracing::debug!(attachment_uuid = %created.uuid, "添付メタデータを登録しました");
        Ok(created.uuid)
    }

    /// `POST /Attachment/{uuid}.file` — 添付レコードにバイナリをmultipartでアップロードする。
    pub async fn upload_attachment_file(
        &self,
        attachment_uuid: &str,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RelayError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| RelayError::Internal(format!("MIMEタイプが不正: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/Attachment/{}.file", self.base_url, attachment_uuid);
        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::Internal(format!("ファイルアップロードの送信に失敗: {e}")))?;

        check_status(response, "署名ファイルのアップロードに失敗", UPLOAD_FAILED).await?;
        Ok(())
    }
}

/// 非成功ステータスの場合、レスポンス本文をログに出力して `Upstream` エラーを返す。
async fn check_status(
    response: reqwest::Response,
    log_context: &str,
    client_message: &'static str,
) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<レスポンス読み取り失敗: {e}>"));
    tracing::error!(status = %status, "{}: {}", log_context, body);

    let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    Err(RelayError::Upstream {
        status,
        message: client_message,
    })
}
