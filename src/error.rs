//! クレート共通エラー型

use thiserror::Error;

pub type YomiageResult<T> = Result<T, YomiageError>;

/// クレート共通エラー
#[derive(Debug, Error)]
pub enum YomiageError {
    #[error("設定エラー: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("話者カタログエラー: {0}")]
    Catalog(#[from] crate::speaker_catalog::CatalogError),

    #[error("読み上げエラー: {0}")]
    Speak(#[from] crate::backends::SpeakError),

    #[error(transparent)]
    General(#[from] anyhow::Error),
}
