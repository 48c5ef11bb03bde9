//! 読み上げエンジン本体（チャットメッセージの受け口）
//!
//! チャットコラボレーターは `handle_message` を呼ぶだけでよい。
//! フィルター・言語判定は同期的に即座に終わり、合成・再生はキュー経由で
//! ワーカーに渡すため、受信フローがバックエンドの遅延に引きずられることはない。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backends::{BackendResolver, PlaybackRequest};
use crate::config::{ConfigSnapshot, SharedConfig};
use crate::dispatch::{SpeechJob, SpeechQueue};
use crate::language;
use crate::pipeline::{self, ChatMessage};

/// デフォルトのキューサイズ上限
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// 読み上げエンジン
pub struct YomiageEngine {
    config: SharedConfig,
    queue: SpeechQueue,
    worker: JoinHandle<()>,
    accepting: AtomicBool,
    arrival_counter: AtomicU64,
}

impl YomiageEngine {
    /// 設定スナップショットとバックエンドリゾルバーからエンジンを作成する
    pub fn new(
        snapshot: ConfigSnapshot,
        resolver: Arc<dyn BackendResolver>,
        queue_capacity: usize,
    ) -> Self {
        let (queue, worker) = SpeechQueue::new(resolver, queue_capacity);
        Self {
            config: SharedConfig::new(snapshot),
            queue,
            worker,
            accepting: AtomicBool::new(true),
            arrival_counter: AtomicU64::new(0),
        }
    }

    /// 現在の設定スナップショットを取得
    pub fn config(&self) -> Arc<ConfigSnapshot> {
        self.config.snapshot()
    }

    /// 設定を差し替える。処理中のメッセージの結果には影響しない
    pub fn update_config(&self, snapshot: ConfigSnapshot) {
        self.config.replace(snapshot);
    }

    /// チャットメッセージの受け口。同期・非ブロッキング
    ///
    /// NGフィルター該当・エンジン未選択・キュー満杯のいずれでも
    /// メッセージは読み上げずに捨てるだけで、エラーは返さない。
    pub fn handle_message(&self, author: &str, text: &str) {
        if !self.accepting.load(Ordering::SeqCst) {
            return;
        }

        let message = ChatMessage {
            author: author.to_string(),
            text: text.to_string(),
            arrival_order: self.arrival_counter.fetch_add(1, Ordering::SeqCst),
        };

        let snapshot = self.config.snapshot();

        let Some(utterance) = pipeline::process(&message, &snapshot.rules) else {
            tracing::debug!("🔇 NGフィルターで除外: {}", message.author);
            return;
        };

        let language_code = language::classify(&utterance);

        let Some(engine) = snapshot.selection.engine_for(&language_code) else {
            tracing::debug!("🔇 言語 {} のエンジン未選択のためスキップ", language_code);
            return;
        };

        let job = SpeechJob {
            engine: engine.clone(),
            request: PlaybackRequest {
                text: utterance,
                volume: snapshot.playback.volume,
                speed: snapshot.playback.speed,
                language_code,
            },
        };

        if let Err(e) = self.queue.try_enqueue(job) {
            tracing::warn!("⚠️ 読み上げキュー追加失敗: {}", e);
        }
    }

    /// 切断。以降の新規メッセージは受け付けない（再生中のものは完了する）
    pub fn disconnect(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        tracing::info!("🔌 切断: 新規メッセージの受け付けを停止");
    }

    /// 再接続。メッセージの受け付けを再開する
    pub fn connect(&self) {
        self.accepting.store(true, Ordering::SeqCst);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// キューを閉じ、積まれたジョブの処理完了を待ってから終了する
    pub async fn shutdown(self) {
        self.accepting.store(false, Ordering::SeqCst);
        let Self { queue, worker, .. } = self;
        // senderを落とすとワーカーループが残ジョブ処理後に終了する
        drop(queue);
        if let Err(e) = worker.await {
            tracing::warn!("⚠️ 読み上げワーカーの終了待ちに失敗: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{SpeakError, SpeechBackend};
    use crate::config::EngineId;
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl SpeechBackend for NullBackend {
        async fn speak(&self, _request: &PlaybackRequest) -> Result<(), SpeakError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "null"
        }
    }

    struct NullResolver;

    impl BackendResolver for NullResolver {
        fn resolve(&self, _engine: &EngineId) -> Option<Arc<dyn SpeechBackend>> {
            Some(Arc::new(NullBackend))
        }
    }

    #[tokio::test]
    async fn test_arrival_order_is_monotonic() {
        let engine = YomiageEngine::new(
            ConfigSnapshot::default(),
            Arc::new(NullResolver),
            DEFAULT_QUEUE_CAPACITY,
        );
        engine.handle_message("a", "one");
        engine.handle_message("b", "two");
        assert_eq!(engine.arrival_counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disconnect_stops_counting() {
        let engine = YomiageEngine::new(
            ConfigSnapshot::default(),
            Arc::new(NullResolver),
            DEFAULT_QUEUE_CAPACITY,
        );
        engine.disconnect();
        assert!(!engine.is_accepting());
        engine.handle_message("a", "dropped");
        assert_eq!(engine.arrival_counter.load(Ordering::SeqCst), 0);

        engine.connect();
        engine.handle_message("a", "counted");
        assert_eq!(engine.arrival_counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_config_swaps_snapshot() {
        let engine = YomiageEngine::new(
            ConfigSnapshot::default(),
            Arc::new(NullResolver),
            DEFAULT_QUEUE_CAPACITY,
        );
        assert!(engine.config().selection.japanese.is_none());

        let mut snapshot = ConfigSnapshot::default();
        snapshot.selection.japanese = Some(EngineId::Bouyomichan);
        engine.update_config(snapshot);

        assert_eq!(
            engine.config().selection.japanese,
            Some(EngineId::Bouyomichan)
        );
    }
}
