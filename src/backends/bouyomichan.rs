//! 棒読みちゃんバックエンド実装
//!
//! ローカルデーモンの `/talk` にフォームPOSTするだけで、音声の再生は
//! デーモン側が行う。音声データは扱わない。

use async_trait::async_trait;
use std::time::Duration;

use super::{PlaybackRequest, SpeakError, SpeechBackend};
use crate::config::BouyomichanConfig;

/// 棒読みちゃんバックエンド
pub struct BouyomichanBackend {
    config: BouyomichanConfig,
    client: reqwest::Client,
}

impl BouyomichanBackend {
    /// 新しいインスタンスを作成
    pub fn new(config: BouyomichanConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("HTTPクライアントの作成に失敗");
        Self { config, client }
    }

    /// 共有HTTPクライアントを使ってインスタンスを作成
    pub fn with_client(client: reqwest::Client, config: BouyomichanConfig) -> Self {
        Self { config, client }
    }

    fn talk_url(&self) -> String {
        format!("http://{}:{}/talk", self.config.host, self.config.port)
    }
}

#[async_trait]
impl SpeechBackend for BouyomichanBackend {
    async fn speak(&self, request: &PlaybackRequest) -> Result<(), SpeakError> {
        if request.text.is_empty() {
            return Ok(());
        }

        tracing::debug!("🔊 棒読みちゃんに送信: {}", request.text);

        let payload = [
            ("text", request.text.clone()),
            ("volume", request.volume.to_string()),
            ("speed", request.speed.to_string()),
        ];

        let response = self.client.post(self.talk_url()).form(&payload).send().await?;

        if response.status().is_success() {
            tracing::debug!("✅ 棒読みちゃん読み上げ成功");
            Ok(())
        } else {
            Err(SpeakError::BackendRejected(response.status()))
        }
    }

    fn name(&self) -> &'static str {
        "棒読みちゃん"
    }
}
