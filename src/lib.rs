//! yomiage - ライブチャット読み上げコア
//!
//! チャットメッセージをNGフィルター・読み替えルールで加工し、言語判定の
//! 結果に応じて棒読みちゃん / VOICEVOX / Google Cloud TTSのいずれかで
//! 読み上げる。チャットの受信やGUI・設定の永続化は外部コラボレーターの
//! 責務で、このクレートは `YomiageEngine::handle_message` の受け口と
//! バックエンドインターフェースだけを公開する。

pub mod backends;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod speaker_catalog;

mod audio;

// Re-export the main types for convenience
pub use backends::{
    BackendRegistry, BackendResolver, BouyomichanBackend, GoogleTtsBackend, PlaybackRequest,
    SpeakError, SpeechBackend, VoicevoxBackend,
};
pub use config::{
    BackendSettings, BouyomichanConfig, ConfigError, ConfigSnapshot, EngineId, EngineSelection,
    GoogleTtsConfig, PlaybackParams, ReplacementRule, RuleSet, RuleSettings, SharedConfig,
    VoicevoxConfig,
};
pub use engine::{YomiageEngine, DEFAULT_QUEUE_CAPACITY};
pub use error::{YomiageError, YomiageResult};
pub use language::classify;
pub use pipeline::{process, ChatMessage};
pub use speaker_catalog::{CatalogError, SpeakerCatalog};
