//! 標準入力のチャット行を読み上げるデモハーネス
//!
//! チャットトランスポートの代わりに「投稿者: 本文」形式の行を標準入力から
//! 受け取り、1行ごとに `YomiageEngine::handle_message` を呼ぶ。

use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use yomiage::{
    BackendRegistry, BackendSettings, ConfigSnapshot, EngineId, EngineSelection, GoogleTtsConfig,
    PlaybackParams, RuleSettings, SpeakerCatalog, YomiageEngine, DEFAULT_QUEUE_CAPACITY,
};

#[derive(Parser)]
#[command(name = "yomiage", about = "ライブチャット読み上げデモ")]
struct Args {
    /// 日本語メッセージ用エンジンの表示名
    /// （棒読みちゃん / Google読み上げ / ずんだもん（ノーマル） など）
    #[arg(long, default_value = "棒読みちゃん")]
    japanese_engine: String,

    /// それ以外の言語用エンジンの表示名。未指定なら日本語以外は読み上げない
    #[arg(long)]
    other_engine: Option<String>,

    /// 音量 (0〜100)
    #[arg(long, default_value_t = 100)]
    volume: u8,

    /// 速度 (50〜200)
    #[arg(long, default_value_t = 100)]
    speed: u16,

    /// 投稿者名を読み上げる
    #[arg(long)]
    announce_name: bool,

    /// Google Cloud TTSのサービスアカウントJSONキーのパス
    #[arg(long)]
    credentials: Option<PathBuf>,
}

fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();

    let settings = BackendSettings {
        google: args
            .credentials
            .map(|credentials_path| GoogleTtsConfig { credentials_path }),
        ..Default::default()
    };

    let registry = Arc::new(BackendRegistry::new(settings.clone()));

    // 話者カタログは起動時に一度だけ取得する。VOICEVOXが起動していなければ
    // 空のカタログで続行する（VOICEVOX系エンジンは選択不可になるだけ）
    let catalog = match SpeakerCatalog::fetch(registry.client(), &settings.voicevox.base_url()).await
    {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!("⚠️ VOICEVOX話者一覧を取得できません: {}", e);
            SpeakerCatalog::default()
        }
    };

    let selection = EngineSelection {
        japanese: EngineId::from_display_key(&catalog, &args.japanese_engine),
        other: args
            .other_engine
            .as_deref()
            .and_then(|key| EngineId::from_display_key(&catalog, key)),
    };
    if selection.japanese.is_none() {
        tracing::warn!(
            "⚠️ 日本語エンジン「{}」を解決できません（日本語メッセージは読み上げられません）",
            args.japanese_engine
        );
    }

    let rules = RuleSettings {
        announce_name: args.announce_name,
        ..Default::default()
    }
    .compile()?;

    let snapshot = ConfigSnapshot {
        rules,
        selection,
        playback: PlaybackParams::new(args.volume, args.speed),
    };

    let engine = YomiageEngine::new(snapshot, registry, DEFAULT_QUEUE_CAPACITY);

    tracing::info!("🎤 「投稿者: 本文」形式で1行ずつ入力してください（Ctrl-Dで終了）");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (author, text) = match line.split_once(':') {
            Some((author, text)) => (author.trim(), text.trim()),
            None => ("viewer", line),
        };
        engine.handle_message(author, text);
    }

    // 入力終了後、キューに残ったメッセージを読み上げ切ってから終了
    engine.shutdown().await;

    Ok(())
}
