//! 読み上げルールとエンジン選択の設定
//!
//! 設定の永続化（ファイル保存）は外部の設定レイヤーの責務。このモジュールは
//! パイプラインが参照するスナップショット型と、保存時の検証だけを提供する。

use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::speaker_catalog::SpeakerCatalog;

/// 設定構築時のエラー
///
/// メッセージ処理中ではなく、ルール保存時にのみ発生する。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("読み替えパターンが不正です ({pattern}): {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// 読み替えルール（正規表現パターン → 置換文字列）
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pattern: Regex,
    replacement: String,
}

impl ReplacementRule {
    /// パターンをコンパイルしてルールを作成。不正な正規表現はここで弾く
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, ConfigError> {
        let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    /// テキスト中の全マッチを置換する
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// 1メッセージの処理に使うルール一式
///
/// パイプラインにはスナップショットとして渡す。処理中のルール変更が
/// 処理結果に影響しないよう、変更時は丸ごと作り直す。
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// NGユーザー（投稿者名の完全一致、大文字小文字は区別する）
    pub ng_users: HashSet<String>,
    /// NGコメント（本文の部分一致、大文字小文字は区別する）
    pub ng_substrings: Vec<String>,
    /// 読み替えルール。登録順に適用され、後のルールは前の結果を見る
    pub replacements: Vec<ReplacementRule>,
    /// 投稿者名を「{名前}：」として本文の前に付けるか
    pub announce_name: bool,
}

/// 設定レイヤーが保存する生のルール設定
///
/// `compile()` で [`RuleSet`] に変換する。不正な読み替えパターンは
/// 保存時（compile時）にエラーになり、メッセージ処理時には到達しない。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSettings {
    #[serde(default)]
    pub ng_users: Vec<String>,
    #[serde(default)]
    pub ng_comments: Vec<String>,
    /// (正規表現パターン, 置換文字列) の組。登録順に適用される
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
    #[serde(default)]
    pub announce_name: bool,
}

impl RuleSettings {
    /// ルール保存時の検証を兼ねたコンパイル
    pub fn compile(&self) -> Result<RuleSet, ConfigError> {
        let mut replacements = Vec::with_capacity(self.replacements.len());
        for (pattern, replacement) in &self.replacements {
            replacements.push(ReplacementRule::new(pattern, replacement.clone())?);
        }
        Ok(RuleSet {
            ng_users: self.ng_users.iter().cloned().collect(),
            ng_substrings: self.ng_comments.clone(),
            replacements,
            announce_name: self.announce_name,
        })
    }
}

/// 読み上げエンジンの識別子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineId {
    /// 棒読みちゃん（ローカルデーモン、再生はデーモン側）
    Bouyomichan,
    /// VOICEVOX（話者ID付き、ローカル合成 + ローカル再生）
    Voicevox { speaker_id: u32 },
    /// Google Cloud TTS
    GoogleTts,
}

impl EngineId {
    /// 設定画面の表示名からエンジンを解決する
    ///
    /// 表示名が棒読みちゃん/Google読み上げのどちらでもなければ
    /// VOICEVOX話者カタログのキーとして引く。未知のキーはNone（設定不備）。
    pub fn from_display_key(catalog: &SpeakerCatalog, key: &str) -> Option<EngineId> {
        match key {
            "棒読みちゃん" => Some(EngineId::Bouyomichan),
            "Google読み上げ" => Some(EngineId::GoogleTts),
            _ => catalog
                .speaker_id(key)
                .map(|speaker_id| EngineId::Voicevox { speaker_id }),
        }
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineId::Bouyomichan => write!(f, "棒読みちゃん"),
            EngineId::Voicevox { speaker_id } => write!(f, "VOICEVOX (話者{})", speaker_id),
            EngineId::GoogleTts => write!(f, "Google読み上げ"),
        }
    }
}

/// 言語ごとのエンジン選択
///
/// スロットがNoneの言語のメッセージは読み上げずに捨てる（設定上の前提で、
/// エラーではない）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSelection {
    /// 日本語（ja-JP）と判定されたメッセージ用
    pub japanese: Option<EngineId>,
    /// それ以外の言語用
    pub other: Option<EngineId>,
}

impl EngineSelection {
    /// 検出言語に対応するエンジンを返す
    pub fn engine_for(&self, language_code: &str) -> Option<&EngineId> {
        if language_code == crate::language::JAPANESE {
            self.japanese.as_ref()
        } else {
            self.other.as_ref()
        }
    }
}

/// 音量・速度の再生パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackParams {
    /// 音量 (0〜100)
    pub volume: u8,
    /// 速度 (50〜200)
    pub speed: u16,
}

impl PlaybackParams {
    /// 範囲外の値はクランプして作成する
    pub fn new(volume: u8, speed: u16) -> Self {
        Self {
            volume: volume.min(100),
            speed: speed.clamp(50, 200),
        }
    }
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            volume: 100,
            speed: 100,
        }
    }
}

/// 棒読みちゃん固有設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BouyomichanConfig {
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
}

impl Default for BouyomichanConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 50080,
        }
    }
}

/// VOICEVOX固有設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicevoxConfig {
    /// ホスト名
    pub host: String,
    /// ポート番号
    pub port: u16,
}

impl VoicevoxConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for VoicevoxConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 50021,
        }
    }
}

/// Google Cloud TTS固有設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTtsConfig {
    /// サービスアカウントJSONキーのパス（検証は読み上げ時）
    pub credentials_path: PathBuf,
}

/// バックエンド接続設定一式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub bouyomichan: BouyomichanConfig,
    #[serde(default)]
    pub voicevox: VoicevoxConfig,
    /// Noneの場合、Google読み上げ選択時のメッセージは読み上げずに捨てる
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleTtsConfig>,
}

/// 1メッセージの処理に使う設定のスナップショット
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    pub rules: RuleSet,
    pub selection: EngineSelection,
    pub playback: PlaybackParams,
}

/// 設定スナップショットの共有ホルダー
///
/// 更新はArcの丸ごと差し替えで行うため、読み手が更新途中の状態を
/// 観測することはない。取得済みのスナップショットは更新の影響を受けない。
#[derive(Debug)]
pub struct SharedConfig {
    inner: RwLock<Arc<ConfigSnapshot>>,
}

impl SharedConfig {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// 現在のスナップショットを取得
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.inner.read().clone()
    }

    /// スナップショットを差し替える
    pub fn replace(&self, snapshot: ConfigSnapshot) {
        *self.inner.write() = Arc::new(snapshot);
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(ConfigSnapshot::default())
    }
}
