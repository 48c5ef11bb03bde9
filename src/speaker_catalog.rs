//! VOICEVOX話者カタログ
//!
//! 起動時に `GET /speakers` で一度だけ取得し、以降は読み取り専用。
//! 表示キー「{キャラクター}（{スタイル}）」からバックエンド固有の
//! 話者IDを引くために使う。

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// カタログ取得時のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("話者一覧の取得に失敗しました: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("話者一覧の取得がエラーを返しました: ステータス {0}")]
    Rejected(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct SpeakerInfo {
    name: String,
    styles: Vec<SpeakerStyle>,
}

#[derive(Debug, Deserialize)]
struct SpeakerStyle {
    name: String,
    id: u32,
}

/// 読み上げ対象として許可するキャラクターとスタイル
const TARGET_CHARACTERS: &[(&str, &[&str])] = &[
    ("ずんだもん", &["ノーマル", "あまあま"]),
    ("四国めたん", &["ノーマル", "あまあま"]),
    ("春日部つむぎ", &["ノーマル"]),
    ("冥鳴ひまり", &["ノーマル"]),
];

/// 表示キー → 話者IDのマッピング
#[derive(Debug, Clone, Default)]
pub struct SpeakerCatalog {
    map: HashMap<String, u32>,
}

impl SpeakerCatalog {
    /// VOICEVOXサービスから話者一覧を取得してカタログを構築する
    pub async fn fetch(client: &reqwest::Client, base_url: &str) -> Result<Self, CatalogError> {
        let url = format!("{}/speakers", base_url);
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Rejected(response.status()));
        }
        let speakers: Vec<SpeakerInfo> = response.json().await?;
        let catalog = Self::from_speakers(speakers);
        tracing::info!("🗣️ 話者カタログを取得: {}件", catalog.len());
        Ok(catalog)
    }

    fn from_speakers(speakers: Vec<SpeakerInfo>) -> Self {
        let mut map = HashMap::new();
        for speaker in speakers {
            let Some((_, styles)) = TARGET_CHARACTERS
                .iter()
                .find(|(name, _)| *name == speaker.name)
            else {
                continue;
            };
            for style in speaker.styles {
                if styles.contains(&style.name.as_str()) {
                    map.insert(format!("{}（{}）", speaker.name, style.name), style.id);
                }
            }
        }
        Self { map }
    }

    /// 表示キーから話者IDを引く。キーがなければNone（設定不備、クラッシュしない）
    pub fn speaker_id(&self, display_key: &str) -> Option<u32> {
        self.map.get(display_key).copied()
    }

    /// 選択可能な表示キーの一覧
    pub fn display_keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|key| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_speakers() -> Vec<SpeakerInfo> {
        vec![
            SpeakerInfo {
                name: "ずんだもん".to_string(),
                styles: vec![
                    SpeakerStyle {
                        name: "ノーマル".to_string(),
                        id: 3,
                    },
                    SpeakerStyle {
                        name: "あまあま".to_string(),
                        id: 1,
                    },
                    SpeakerStyle {
                        name: "ささやき".to_string(),
                        id: 22,
                    },
                ],
            },
            SpeakerInfo {
                name: "春日部つむぎ".to_string(),
                styles: vec![SpeakerStyle {
                    name: "ノーマル".to_string(),
                    id: 8,
                }],
            },
            SpeakerInfo {
                name: "許可外キャラ".to_string(),
                styles: vec![SpeakerStyle {
                    name: "ノーマル".to_string(),
                    id: 99,
                }],
            },
        ]
    }

    #[test]
    fn test_allow_list_filtering() {
        let catalog = SpeakerCatalog::from_speakers(sample_speakers());

        // 許可リストのキャラクター・スタイルのみ登録される
        assert_eq!(catalog.speaker_id("ずんだもん（ノーマル）"), Some(3));
        assert_eq!(catalog.speaker_id("ずんだもん（あまあま）"), Some(1));
        assert_eq!(catalog.speaker_id("春日部つむぎ（ノーマル）"), Some(8));
        assert_eq!(catalog.len(), 3);

        // 許可外のスタイル・キャラクターは落ちる
        assert_eq!(catalog.speaker_id("ずんだもん（ささやき）"), None);
        assert_eq!(catalog.speaker_id("許可外キャラ（ノーマル）"), None);
    }

    #[test]
    fn test_missing_key_returns_none() {
        let catalog = SpeakerCatalog::default();
        assert_eq!(catalog.speaker_id("ずんだもん（ノーマル）"), None);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_display_key_format_uses_fullwidth_parens() {
        let catalog = SpeakerCatalog::from_speakers(sample_speakers());
        for key in catalog.display_keys() {
            assert!(key.contains('（') && key.ends_with('）'));
        }
    }

    #[test]
    fn test_speakers_response_deserialization() {
        let json = r#"[{"name":"ずんだもん","styles":[{"name":"ノーマル","id":3}]}]"#;
        let speakers: Vec<SpeakerInfo> = serde_json::from_str(json).unwrap();
        let catalog = SpeakerCatalog::from_speakers(speakers);
        assert_eq!(catalog.speaker_id("ずんだもん（ノーマル）"), Some(3));
    }
}
