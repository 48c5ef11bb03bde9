//! Google Cloud TTSバックエンド実装
//!
//! サービスアカウントキーでトークンを取得し、REST APIで合成したMP3を
//! ローカルで再生する。認証・API・レスポンス処理のどの失敗も
//! `SpeakError::AuthOrBackend` に畳む。

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{PlaybackRequest, SpeakError, SpeechBackend};
use crate::config::GoogleTtsConfig;

const SYNTHESIZE_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelectionParams<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelectionParams<'a> {
    language_code: &'a str,
    ssml_gender: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    volume_gain_db: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl<'a> SynthesizeRequest<'a> {
    fn from_playback(request: &'a PlaybackRequest) -> Self {
        Self {
            input: SynthesisInput {
                text: &request.text,
            },
            voice: VoiceSelectionParams {
                language_code: &request.language_code,
                ssml_gender: "NEUTRAL",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: f64::from(request.speed) / 100.0,
                volume_gain_db: f64::from(request.volume) / 100.0,
            },
        }
    }
}

/// Google Cloud TTSバックエンド
pub struct GoogleTtsBackend {
    config: GoogleTtsConfig,
    client: reqwest::Client,
}

impl GoogleTtsBackend {
    /// 新しいインスタンスを作成
    pub fn new(config: GoogleTtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTPクライアントの作成に失敗");
        Self { config, client }
    }

    /// 共有HTTPクライアントを使ってインスタンスを作成
    pub fn with_client(client: reqwest::Client, config: GoogleTtsConfig) -> Self {
        Self { config, client }
    }

    /// サービスアカウントキーからアクセストークンを取得
    async fn fetch_token(&self) -> Result<String, SpeakError> {
        let key = yup_oauth2::read_service_account_key(&self.config.credentials_path)
            .await
            .map_err(|e| {
                SpeakError::AuthOrBackend(format!("認証情報の読み込みに失敗: {}", e))
            })?;

        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| SpeakError::AuthOrBackend(format!("認証の初期化に失敗: {}", e)))?;

        let token = auth
            .token(SCOPES)
            .await
            .map_err(|e| SpeakError::AuthOrBackend(format!("トークンの取得に失敗: {}", e)))?;

        token
            .token()
            .map(|t| t.to_string())
            .ok_or_else(|| SpeakError::AuthOrBackend("アクセストークンが空です".to_string()))
    }
}

#[async_trait]
impl SpeechBackend for GoogleTtsBackend {
    async fn speak(&self, request: &PlaybackRequest) -> Result<(), SpeakError> {
        if request.text.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            "🔊 Google TTSに送信 ({}): {}",
            request.language_code,
            request.text
        );

        let token = self.fetch_token().await?;
        let body = SynthesizeRequest::from_playback(request);

        let response = self
            .client
            .post(SYNTHESIZE_ENDPOINT)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeakError::AuthOrBackend(format!("Google TTS APIに接続できません: {}", e)))?;

        if !response.status().is_success() {
            return Err(SpeakError::AuthOrBackend(format!(
                "Google TTS APIがエラーを返しました: ステータス {}",
                response.status()
            )));
        }

        let synthesized: SynthesizeResponse = response.json().await.map_err(|e| {
            SpeakError::AuthOrBackend(format!("Google TTSレスポンスの解析に失敗: {}", e))
        })?;

        let mp3_bytes = BASE64_STANDARD
            .decode(synthesized.audio_content)
            .map_err(|e| SpeakError::AudioDecode(format!("audioContentのデコードに失敗: {}", e)))?;

        crate::audio::play(mp3_bytes).await?;

        tracing::debug!("✅ Google TTS読み上げ完了");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Google読み上げ"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(volume: u8, speed: u16, language_code: &str) -> PlaybackRequest {
        PlaybackRequest {
            text: "hello".to_string(),
            volume,
            speed,
            language_code: language_code.to_string(),
        }
    }

    #[test]
    fn test_synthesize_request_wire_format() {
        let playback = request(50, 150, "en");
        let body = SynthesizeRequest::from_playback(&playback);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["input"]["text"], "hello");
        assert_eq!(json["voice"]["languageCode"], "en");
        assert_eq!(json["voice"]["ssmlGender"], "NEUTRAL");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
        assert_eq!(json["audioConfig"]["speakingRate"], serde_json::json!(1.5));
        assert_eq!(json["audioConfig"]["volumeGainDb"], serde_json::json!(0.5));
    }

    #[test]
    fn test_synthesize_response_deserialization() {
        let json = r#"{"audioContent":"aGVsbG8="}"#;
        let response: SynthesizeResponse = serde_json::from_str(json).unwrap();
        let bytes = BASE64_STANDARD.decode(response.audio_content).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_error() {
        let backend = GoogleTtsBackend::new(GoogleTtsConfig {
            credentials_path: "/nonexistent/credentials.json".into(),
        });
        let err = backend.speak(&request(100, 100, "en")).await.unwrap_err();
        assert!(matches!(err, SpeakError::AuthOrBackend(_)));
    }
}
