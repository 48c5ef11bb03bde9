//! 読み上げバックエンド実装
//!
//! 「合成して再生する」能力を一つのトレイトに揃え、棒読みちゃん・VOICEVOX・
//! Google Cloud TTSの3実装を提供する。プラグイン拡張は想定しない固定セット。

pub mod bouyomichan;
pub mod google_tts;
pub mod voicevox;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{BackendSettings, EngineId, VoicevoxConfig};

pub use bouyomichan::BouyomichanBackend;
pub use google_tts::GoogleTtsBackend;
pub use voicevox::VoicevoxBackend;

/// 読み上げエラー型
#[derive(Debug, Error)]
pub enum SpeakError {
    #[error("バックエンドに接続できません: {0}")]
    Unreachable(String),

    #[error("バックエンドがエラーを返しました: ステータス {0}")]
    BackendRejected(reqwest::StatusCode),

    #[error("認証またはバックエンドのエラー: {0}")]
    AuthOrBackend(String),

    #[error("音声デコードエラー: {0}")]
    AudioDecode(String),

    #[error("音声出力エラー: {0}")]
    AudioOutput(String),

    #[error("読み上げキューが満杯です")]
    QueueFull,
}

impl From<reqwest::Error> for SpeakError {
    fn from(err: reqwest::Error) -> Self {
        SpeakError::Unreachable(err.to_string())
    }
}

/// 1メッセージ分の読み上げリクエスト
///
/// メッセージごとに導出し、永続化しない。
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    /// 読み上げ文字列（フィルター・読み替え適用後）
    pub text: String,
    /// 音量 (0〜100)
    pub volume: u8,
    /// 速度 (50〜200)
    pub speed: u16,
    /// 判定済み言語コード
    pub language_code: String,
}

/// 読み上げバックエンドトレイト
///
/// 各speak呼び出しは独立で、同一バックエンドへの並行呼び出しも可能
/// （共有するのはHTTPクライアントのコネクションプールのみ）。
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// テキストを合成して再生する
    ///
    /// Okを返した時点で音声はデーモンまたはローカル出力デバイスに
    /// 渡し終えている（呼び出し側から見て同期）。
    async fn speak(&self, request: &PlaybackRequest) -> Result<(), SpeakError>;

    /// バックエンド名
    fn name(&self) -> &'static str;
}

/// エンジン識別子から具体的なバックエンドを解決する
///
/// テストではダブルを差し込むための継ぎ目。
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, engine: &EngineId) -> Option<Arc<dyn SpeechBackend>>;
}

/// 本番用バックエンドレジストリ
///
/// HTTPクライアントは全バックエンドで共有する。VOICEVOXは話者IDごとに
/// インスタンスを作り、作成済みのものを使い回す。
pub struct BackendRegistry {
    client: reqwest::Client,
    bouyomichan: Arc<BouyomichanBackend>,
    google: Option<Arc<GoogleTtsBackend>>,
    voicevox_config: VoicevoxConfig,
    voicevox: RwLock<HashMap<u32, Arc<VoicevoxBackend>>>,
}

impl BackendRegistry {
    /// 接続設定からレジストリを作成する
    pub fn new(settings: BackendSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTPクライアントの作成に失敗");

        let bouyomichan = Arc::new(BouyomichanBackend::with_client(
            client.clone(),
            settings.bouyomichan,
        ));
        let google = settings
            .google
            .map(|config| Arc::new(GoogleTtsBackend::with_client(client.clone(), config)));

        Self {
            client,
            bouyomichan,
            google,
            voicevox_config: settings.voicevox,
            voicevox: RwLock::new(HashMap::new()),
        }
    }

    /// 共有HTTPクライアント（話者カタログ取得などに使う）
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl BackendResolver for BackendRegistry {
    fn resolve(&self, engine: &EngineId) -> Option<Arc<dyn SpeechBackend>> {
        match engine {
            EngineId::Bouyomichan => Some(self.bouyomichan.clone() as Arc<dyn SpeechBackend>),
            EngineId::GoogleTts => self
                .google
                .clone()
                .map(|backend| backend as Arc<dyn SpeechBackend>),
            EngineId::Voicevox { speaker_id } => {
                if let Some(backend) = self.voicevox.read().get(speaker_id) {
                    return Some(backend.clone() as Arc<dyn SpeechBackend>);
                }
                let backend = Arc::new(VoicevoxBackend::with_client(
                    self.client.clone(),
                    self.voicevox_config.clone(),
                    *speaker_id,
                ));
                let backend = self
                    .voicevox
                    .write()
                    .entry(*speaker_id)
                    .or_insert(backend)
                    .clone();
                Some(backend as Arc<dyn SpeechBackend>)
            }
        }
    }
}
