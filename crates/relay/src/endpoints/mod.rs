//! # リレーエンドポイント

pub mod signature_upload;

#[cfg(test)]
pub mod test_helpers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::any;

use crate::config::RelayState;
use crate::cors::apply_cors_headers;

pub use signature_upload::handle_signature_upload;

/// リレーのルーターを構築する。
///
/// パスを問わず全リクエストを署名アップロードハンドラに渡し、
/// メソッドの判定はハンドラ側で行う。
pub fn router(state: Arc<RelayState>) -> axum::Router {
    let body_limit = state.config.max_request_body_bytes();
    axum::Router::new()
        .route("/", any(handle_signature_upload))
        .fallback(handle_signature_upload)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::map_response(apply_cors_headers))
        .with_state(state)
}
