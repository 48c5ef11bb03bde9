//! 言語判定
//!
//! ひらがな・カタカナ・漢字を1文字でも含めば日本語と判定し、それ以外は
//! 統計的判定にフォールバックする。ベストエフォートの判定であり保証ではない。

/// 日本語メッセージに割り当てる言語コード
pub const JAPANESE: &str = "ja-JP";

/// 判定失敗時のフォールバック
const FALLBACK: &str = "en";

/// ひらがな・カタカナ（U+3040〜U+30FF）または漢字（U+4E00〜U+9FFF）を含むか
fn contains_japanese(text: &str) -> bool {
    text.chars().any(|c| {
        let code = c as u32;
        (0x3040..=0x30FF).contains(&code) || (0x4E00..=0x9FFF).contains(&code)
    })
}

/// メッセージの言語コードを判定する
///
/// 日本語文字を含めば混在テキストでも "ja-JP"。それ以外はwhatlangで判定し、
/// 短すぎる・空・判定不能なテキストは "en" に倒す（例外は出さない）。
pub fn classify(text: &str) -> String {
    if contains_japanese(text) {
        return JAPANESE.to_string();
    }

    whatlang::detect(text)
        .map(|info| shorten_code(info.lang().code()).to_string())
        .unwrap_or_else(|| FALLBACK.to_string())
}

/// whatlangのISO 639-3コードをTTS向けの短いコードに寄せる
fn shorten_code(code: &str) -> &str {
    match code {
        "eng" => "en",
        "spa" => "es",
        "fra" => "fr",
        "deu" => "de",
        "ita" => "it",
        "por" => "pt",
        "rus" => "ru",
        "kor" => "ko",
        "hin" => "hi",
        "cmn" | "zho" => "zh",
        other => other,
    }
}
