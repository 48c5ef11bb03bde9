//! 読み上げディスパッチ
//!
//! 受信フローと合成・再生を切り離すための有界FIFOキューと単一ワーカー。
//! ワーカーは1件ずつ処理するため、発話はディスパッチ順に1つずつ再生される。
//! バックエンドの失敗はここで握りつぶし、受信フローには決して伝播しない。

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backends::{BackendResolver, PlaybackRequest, SpeakError};
use crate::config::EngineId;

/// キューに積む1件分の読み上げジョブ
#[derive(Debug, Clone)]
pub struct SpeechJob {
    pub engine: EngineId,
    pub request: PlaybackRequest,
}

/// 読み上げキュー
pub struct SpeechQueue {
    sender: mpsc::Sender<SpeechJob>,
}

impl SpeechQueue {
    /// キューを作成してワーカータスクを起動する
    pub fn new(
        resolver: Arc<dyn BackendResolver>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = tokio::spawn(Self::process_queue(receiver, resolver));
        (Self { sender }, handle)
    }

    /// ジョブを積む。キューが満杯でも呼び出し側をブロックしない
    ///
    /// 満杯時はQueueFull（そのメッセージは読み上げられない。再試行はしない）。
    pub fn try_enqueue(&self, job: SpeechJob) -> Result<(), SpeakError> {
        self.sender.try_send(job).map_err(|_| SpeakError::QueueFull)
    }

    /// キュー処理タスク
    async fn process_queue(
        mut receiver: mpsc::Receiver<SpeechJob>,
        resolver: Arc<dyn BackendResolver>,
    ) {
        tracing::info!("🔊 読み上げキュー処理を開始");

        while let Some(job) = receiver.recv().await {
            let Some(backend) = resolver.resolve(&job.engine) else {
                tracing::debug!("🔇 バックエンド未設定のためスキップ: {}", job.engine);
                continue;
            };

            tracing::debug!(
                "📢 読み上げ開始: [{}] {}",
                backend.name(),
                preview(&job.request.text)
            );

            match backend.speak(&job.request).await {
                Ok(()) => {
                    tracing::debug!("✅ 読み上げ完了");
                }
                Err(e) => {
                    // ログのみ。受信フローにも他のジョブにも影響させない
                    tracing::error!("❌ 読み上げエラー ({}): {}", backend.name(), e);
                }
            }
        }

        tracing::info!("🔊 読み上げキュー処理を終了");
    }
}

impl Clone for SpeechQueue {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// ログ用にテキストを先頭40文字へ丸める
fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}
