//! # エンドポイントテスト用共通ヘルパー
//!
//! モックServiceM8とリレー本体をエフェメラルポートで起動する。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::{RelayConfig, RelayState};

/// モックServiceM8のAPIベースパス
pub const MOCK_API_PREFIX: &str = "/api_1.0";

/// モックが返す添付UUID
pub const MOCK_ATTACHMENT_UUID: &str = "att-123";

/// テスト用APIキー
pub const TEST_API_KEY: &str = "test-key";

/// モックServiceM8が受信したファイルアップロード。
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// `/Attachment/` 以降のパスセグメント（例: `att-123.file`）
    pub path_segment: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// モックServiceM8の応答設定と受信記録。
pub struct MockServiceM8 {
    pub metadata_status: StatusCode,
    /// Noneの場合、uuidを含まないボディを返す
    pub metadata_uuid: Option<&'static str>,
    pub upload_status: StatusCode,
    pub metadata_hits: AtomicUsize,
    pub upload_hits: AtomicUsize,
    pub api_keys: Mutex<Vec<String>>,
    pub last_metadata: Mutex<Option<serde_json::Value>>,
    pub last_upload: Mutex<Option<RecordedUpload>>,
}

impl MockServiceM8 {
    /// 両ステップとも成功するモック
    pub fn ok() -> Self {
        Self::with_statuses(StatusCode::OK, StatusCode::OK)
    }

    pub fn with_statuses(metadata_status: StatusCode, upload_status: StatusCode) -> Self {
        Self {
            metadata_status,
            metadata_uuid: Some(MOCK_ATTACHMENT_UUID),
            upload_status,
            metadata_hits: AtomicUsize::new(0),
            upload_hits: AtomicUsize::new(0),
            api_keys: Mutex::new(Vec::new()),
            last_metadata: Mutex::new(None),
            last_upload: Mutex::new(None),
        }
    }

    pub fn metadata_hits(&self) -> usize {
        self.metadata_hits.load(Ordering::SeqCst)
    }

    pub fn upload_hits(&self) -> usize {
        self.upload_hits.load(Ordering::SeqCst)
    }

    fn record_api_key(&self, headers: &HeaderMap) {
        let key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.api_keys.lock().unwrap().push(key);
    }
}

async fn mock_create_attachment(
    State(mock): State<Arc<MockServiceM8>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    mock.metadata_hits.fetch_add(1, Ordering::SeqCst);
    mock.record_api_key(&headers);
    *mock.last_metadata.lock().unwrap() = Some(body);

    if !mock.metadata_status.is_success() {
        return (mock.metadata_status, "remote metadata failure detail").into_response();
    }
    match mock.metadata_uuid {
        Some(uuid) => (
            mock.metadata_status,
            Json(serde_json::json!({ "uuid": uuid, "active": 1 })),
        )
            .into_response(),
        None => (mock.metadata_status, Json(serde_json::json!({}))).into_response(),
    }
}

async fn mock_upload_file(
    State(mock): State<Arc<MockServiceM8>>,
    Path(path_segment): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.upload_hits.fetch_add(1, Ordering::SeqCst);
    mock.record_api_key(&headers);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    *mock.last_upload.lock().unwrap() = Some(RecordedUpload {
        path_segment,
        content_type,
        body: body.to_vec(),
    });

    if !mock.upload_status.is_success() {
        return (mock.upload_status, "remote upload failure detail").into_response();
    }
    (mock.upload_status, Json(serde_json::json!({ "errorCode": 0 }))).into_response()
}

/// テスト用モックServiceM8を起動し、APIベースURLを返す。
pub async fn start_mock_servicem8(mock: Arc<MockServiceM8>) -> String {
    use axum::routing::post;

    let app = axum::Router::new()
        .route(
            &format!("{MOCK_API_PREFIX}/Attachment.json"),
            post(mock_create_attachment),
        )
        .route(
            &format!("{MOCK_API_PREFIX}/Attachment/{{file}}"),
            post(mock_upload_file),
        )
        .layer(axum::extract::DefaultBodyLimit::max(8 * 1024 * 1024))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}{MOCK_API_PREFIX}")
}

/// 接続を受け付けないベースURLを返す（通信失敗のテスト用）。
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{MOCK_API_PREFIX}")
}

/// テスト用の設定（APIキーは固定、ベースURLは引数）
pub fn test_config(base_url: &str) -> RelayConfig {
    let mut config = RelayConfig::new(TEST_API_KEY);
    config.base_url = base_url.to_string();
    config
}

/// リレー本体を起動し、ベースURLを返す。
pub async fn start_relay(config: RelayConfig) -> String {
    let app = super::router(Arc::new(RelayState::new(config)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}
