//! VOICEVOXバックエンド実装
//!
//! audio_query → 音量/速度スケールの適用 → synthesis の2段プロトコル。
//! 返ってきたWAVをローカルで再生する。

use async_trait::async_trait;
use std::time::Duration;

use super::{PlaybackRequest, SpeakError, SpeechBackend};
use crate::config::VoicevoxConfig;

/// VOICEVOXバックエンド（話者IDごとに1インスタンス）
pub struct VoicevoxBackend {
    config: VoicevoxConfig,
    speaker_id: u32,
    client: reqwest::Client,
}

impl VoicevoxBackend {
    /// 新しいインスタンスを作成
    pub fn new(config: VoicevoxConfig, speaker_id: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTPクライアントの作成に失敗");
        Self {
            config,
            speaker_id,
            client,
        }
    }

    /// 共有HTTPクライアントを使ってインスタンスを作成
    pub fn with_client(client: reqwest::Client, config: VoicevoxConfig, speaker_id: u32) -> Self {
        Self {
            config,
            speaker_id,
            client,
        }
    }

    /// 音声合成クエリを取得
    async fn audio_query(&self, text: &str) -> Result<serde_json::Value, SpeakError> {
        let url = format!(
            "{}/audio_query?speaker={}&text={}",
            self.config.base_url(),
            self.speaker_id,
            urlencoding::encode(text),
        );

        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(SpeakError::BackendRejected(response.status()));
        }
        Ok(response.json().await?)
    }

    /// クエリに再生パラメータを反映する（スケールは 値/100.0）
    fn apply_playback_scales(query: &mut serde_json::Value, volume: u8, speed: u16) {
        if let Some(obj) = query.as_object_mut() {
            obj.insert(
                "volumeScale".to_string(),
                serde_json::json!(f64::from(volume) / 100.0),
            );
            obj.insert(
                "speedScale".to_string(),
                serde_json::json!(f64::from(speed) / 100.0),
            );
        }
    }

    /// 音声合成を実行してWAVデータを受け取る
    async fn synthesize(&self, audio_query: &serde_json::Value) -> Result<Vec<u8>, SpeakError> {
        let url = format!(
            "{}/synthesis?speaker={}",
            self.config.base_url(),
            self.speaker_id,
        );

        let response = self.client.post(&url).json(audio_query).send().await?;
        if !response.status().is_success() {
            return Err(SpeakError::BackendRejected(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechBackend for VoicevoxBackend {
    async fn speak(&self, request: &PlaybackRequest) -> Result<(), SpeakError> {
        if request.text.is_empty() {
            return Ok(());
        }

        tracing::debug!("🔊 VOICEVOX(話者{})に送信: {}", self.speaker_id, request.text);

        let mut audio_query = self.audio_query(&request.text).await?;
        Self::apply_playback_scales(&mut audio_query, request.volume, request.speed);
        let wav_bytes = self.synthesize(&audio_query).await?;

        // いずれかの段階で失敗した場合はここまで到達せず、部分再生は起きない
        crate::audio::play(wav_bytes).await?;

        tracing::debug!("✅ VOICEVOX読み上げ完了");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "VOICEVOX"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_playback_scales() {
        let mut query = serde_json::json!({
            "accentPhrases": [],
            "volumeScale": 0.0,
            "speedScale": 0.0
        });

        VoicevoxBackend::apply_playback_scales(&mut query, 50, 150);

        assert_eq!(query["volumeScale"], serde_json::json!(0.5));
        assert_eq!(query["speedScale"], serde_json::json!(1.5));
        // 他のフィールドはそのまま
        assert!(query["accentPhrases"].is_array());
    }

    #[test]
    fn test_apply_playback_scales_at_bounds() {
        let mut query = serde_json::json!({});
        VoicevoxBackend::apply_playback_scales(&mut query, 100, 200);
        assert_eq!(query["volumeScale"], serde_json::json!(1.0));
        assert_eq!(query["speedScale"], serde_json::json!(2.0));

        let mut query = serde_json::json!({});
        VoicevoxBackend::apply_playback_scales(&mut query, 0, 50);
        assert_eq!(query["volumeScale"], serde_json::json!(0.0));
        assert_eq!(query["speedScale"], serde_json::json!(0.5));
    }

    #[test]
    fn test_audio_query_url_encodes_text() {
        let backend = VoicevoxBackend::new(VoicevoxConfig::default(), 3);
        let url = format!(
            "{}/audio_query?speaker={}&text={}",
            backend.config.base_url(),
            backend.speaker_id,
            urlencoding::encode("こんにちは！"),
        );
        assert!(url.starts_with("http://localhost:50021/audio_query?speaker=3&text="));
        // 日本語はエンコードされているはず
        assert!(!url.contains("こんにちは"));
    }
}
