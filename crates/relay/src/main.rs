//! # SM8 署名リレー
//!
//! Data URI形式の署名画像をServiceM8のジョブ添付ファイルとして中継するHTTPサーバー。
//!
//! ## API エンドポイント
//! - `OPTIONS *` — CORSプリフライト（空の200）
//! - `POST *` — `{jobUUID, signature}` を受け取り、ServiceM8に添付を作成する

mod config;
mod cors;
mod endpoints;
mod error;
mod servicem8;
mod signature;

use std::sync::Arc;

use config::{RelayConfig, RelayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = RelayConfig::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        max_signature_bytes = config.max_signature_bytes,
        "ServiceM8設定を読み込みました"
    );

    let addr = config.bind_addr.clone();
    let state = Arc::new(RelayState::new(config));
    let app = endpoints::router(state);

    tracing::info!("署名リレーを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
