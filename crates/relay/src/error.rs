//! # リレー エラー型
//!
//! 全てのエラーは `{"error": "..."}` 形式のJSONレスポンスに変換される。
//! ServiceM8の生のエラー本文はログにのみ出力し、クライアントには返さない。

use axum::http::StatusCode;
use axum::Json;
use sm8_relay_types::ErrorResponse;

/// リレーエラー型。
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// POST/OPTIONS以外のメソッド
    #[error("Method not allowed. Use POST for this endpoint.")]
    MethodNotAllowed,
    /// 不正なリクエスト（必須フィールド欠落、不正な署名形式）
    #[error("{0}")]
    BadRequest(String),
    /// デコード後の署名画像がサイズ上限を超過
    #[error("Attachment exceeds file size limit ({0}).")]
    PayloadTooLarge(String),
    /// ServiceM8が非成功ステータスを返した。ステータスはそのままクライアントに返す。
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: &'static str,
    },
    /// 想定外のエラー（通信失敗、レスポンスのパース失敗）
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// このエラーに対応するHTTPステータス。
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        if let RelayError::Internal(ref e) = self {
            tracing::error!("サーバーエラー: {}", e);
        }
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
