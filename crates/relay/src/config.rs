//! # リレー設定・共有状態
//!
//! 環境変数からの設定読み込みとリレーの共有状態の定義。
//! 設定は起動時に一度だけ読み込み、リクエスト処理中に変更しない。

use anyhow::Context;

use crate::servicem8::ServiceM8Client;

/// ServiceM8 APIのデフォルトベースURL
pub const DEFAULT_SERVICEM8_BASE_URL: &str = "https://api.servicem8.com/api_1.0";

/// デフォルトのリッスンアドレス
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// デコード後の署名画像の最大サイズ（1 MiB）
pub const DEFAULT_MAX_SIGNATURE_BYTES: usize = 1024 * 1024;

/// リレー設定。
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// ServiceM8 APIキー（`X-Api-Key` ヘッダで送信）
    pub api_key: String,
    /// ServiceM8 APIのベースURL（末尾スラッシュなし）
    pub base_url: String,
    /// リッスンアドレス
    pub bind_addr: String,
    /// デコード後の署名画像の最大バイト数
    pub max_signature_bytes: usize,
}

impl RelayConfig {
    /// 指定したAPIキーとデフォルト値で設定を構築する。
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_SERVICEM8_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_signature_bytes: DEFAULT_MAX_SIGNATURE_BYTES,
        }
    }

    /// 環境変数から設定を読み込む。
    ///
    /// - `SERVICEM8_API_KEY`（必須）
    /// - `SERVICEM8_BASE_URL`
    /// - `RELAY_BIND_ADDR`
    /// - `RELAY_MAX_SIGNATURE_BYTES`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を読み込む。テストでは環境変数の代わりにマップを渡す。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("SERVICEM8_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("SERVICEM8_API_KEYが設定されていません"))?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup("SERVICEM8_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(bind_addr) = lookup("RELAY_BIND_ADDR") {
            config.bind_addr = bind_addr;
        }
        if let Some(max) = lookup("RELAY_MAX_SIGNATURE_BYTES") {
            config.max_signature_bytes = max
                .parse()
                .with_context(|| format!("RELAY_MAX_SIGNATURE_BYTESが不正です: {max}"))?;
        }

        Ok(config)
    }

    /// 受信ボディの上限バイト数。
    ///
    /// Base64はデコード後の約4/3倍になるため、Data URIの接頭辞とJSONの余白を見込んで
    /// 署名上限の2倍を許容する。これを超えない範囲の超過は413としてハンドラで判定される。
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_signature_bytes.saturating_mul(2)
    }
}

/// リレーの共有状態。
pub struct RelayState {
    /// 起動時に読み込んだ設定
    pub config: RelayConfig,
    /// ServiceM8 APIクライアント
    pub servicem8: ServiceM8Client,
}

impl RelayState {
    /// 設定からHTTPクライアントを含む共有状態を構築する。
    pub fn new(config: RelayConfig) -> Self {
        let servicem8 = ServiceM8Client::new(
            reqwest::Client::new(),
            config.base_url.clone(),
            config.api_key.clone(),
        );
        Self { config, servicem8 }
    }
}
