//! メッセージパイプライン（NGフィルター → 名前付与 → 読み替え）
//!
//! 純粋な変換のみ。I/Oもロックも持たないため、受信フローを遅延させない。

use crate::config::RuleSet;

/// チャットコラボレーターから受け取る1メッセージ
///
/// 受信後は不変。処理後は保持しない。
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// 投稿者名
    pub author: String,
    /// 本文
    pub text: String,
    /// 到着順の単調カウンター
    pub arrival_order: u64,
}

/// メッセージをルールに従って読み上げ文字列へ変換する
///
/// ステップは固定順で、入れ替え不可:
/// 1. NGフィルター（ユーザー完全一致 / コメント部分一致、該当すればNone）
/// 2. 名前付与（announce_name時に「{投稿者}：」を前置、コロンは全角）
/// 3. 読み替え（登録順の正規表現置換。後のルールは前の結果を見る）
///
/// 名前付与は読み替えより先に行うため、読み替えルールが付与した名前に
/// マッチすることがある。これは元の挙動をそのまま保っている。
pub fn process(msg: &ChatMessage, rules: &RuleSet) -> Option<String> {
    if rules.ng_users.contains(&msg.author) {
        return None;
    }
    if rules
        .ng_substrings
        .iter()
        .any(|ng| msg.text.contains(ng.as_str()))
    {
        return None;
    }

    let mut text = if rules.announce_name {
        format!("{}：{}", msg.author, msg.text)
    } else {
        msg.text.clone()
    };

    for rule in &rules.replacements {
        text = rule.apply(&text);
    }

    Some(text)
}
