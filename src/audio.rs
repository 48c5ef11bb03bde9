//! 音声再生ヘルパー
//!
//! VOICEVOX（WAV）とGoogle TTS（MP3）の両バックエンドが共用する。

use rodio::{Decoder, OutputStream, Sink};
use std::io::Cursor;

use crate::backends::SpeakError;

/// 音声データをデコードして再生する（ブロッキング、再生完了まで戻らない）
pub(crate) fn play_blocking(audio_bytes: Vec<u8>) -> Result<(), SpeakError> {
    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| SpeakError::AudioOutput(format!("音声出力の初期化に失敗: {}", e)))?;

    let sink = Sink::try_new(&stream_handle)
        .map_err(|e| SpeakError::AudioOutput(format!("音声シンクの作成に失敗: {}", e)))?;

    let source = Decoder::new(Cursor::new(audio_bytes))
        .map_err(|e| SpeakError::AudioDecode(format!("音声デコードに失敗: {}", e)))?;

    sink.append(source);
    sink.sleep_until_end();

    Ok(())
}

/// ブロッキング再生をspawn_blockingで実行し、再生完了を待つ
pub(crate) async fn play(audio_bytes: Vec<u8>) -> Result<(), SpeakError> {
    tokio::task::spawn_blocking(move || play_blocking(audio_bytes))
        .await
        .map_err(|e| SpeakError::AudioOutput(format!("再生タスクエラー: {}", e)))?
}
