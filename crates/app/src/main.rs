use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use voxchat_app::config::AppConfig;
use voxchat_app::runtime::Runtime;
use voxchat_playback::error::DeliveryError;
use voxchat_playback::{EventSink, PlayRequest, PlaybackEvent, Sentence};

#[derive(Parser, Debug)]
#[command(name = "voxchat", about = "Sentence-level TTS playback pipeline")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "VOXCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Text file to speak, one sentence per line
    text_file: PathBuf,

    /// Override the configured voice
    #[arg(long)]
    voice: Option<String>,

    /// Override the configured speech rate
    #[arg(long)]
    rate: Option<f32>,

    /// Session the message belongs to
    #[arg(long, default_value_t = 1)]
    session_id: u64,

    /// Message id within the session
    #[arg(long, default_value_t = 1)]
    message_id: u64,

    /// Synthesize clips into the cache without playing them
    #[arg(long)]
    pregenerate_only: bool,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "voxchat.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(_guard);
    Ok(())
}

/// Prints each progress event as one JSON line on stdout, the same shape a
/// websocket handler would forward to the client.
struct JsonLineSink;

#[async_trait]
impl EventSink for JsonLineSink {
    async fn deliver(&self, event: PlaybackEvent) -> Result<(), DeliveryError> {
        let line = serde_json::json!({
            "type": "on_audio_playback",
            "sentence_id": event.wire_id(),
        });
        println!("{}", line);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::info!("Starting VoxChat playback pipeline");

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(voice) = cli.voice {
        config.voice = voice;
    }
    if let Some(rate) = cli.rate {
        config.speech_rate = rate;
    }

    let text = std::fs::read_to_string(&cli.text_file)?;
    let sentences: Vec<Sentence> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| Sentence::new(i as u32, line))
        .collect();
    if sentences.is_empty() {
        return Err(anyhow::anyhow!("{} contains no sentences", cli.text_file.display()).into());
    }
    tracing::info!(count = sentences.len(), "Loaded sentences");

    let runtime = Runtime::init(&config).await?;
    let orchestrator = runtime.orchestrator();

    let first_id = sentences[0].id;
    let last_id = sentences[sentences.len() - 1].id;
    let request = PlayRequest {
        session_id: cli.session_id,
        message_id: cli.message_id,
        sentences,
        voice: config.voice.clone(),
        speech_rate: config.speech_rate,
    };

    if cli.pregenerate_only {
        let worker = orchestrator
            .pregenerate(request, first_id, last_id)
            .map_err(|e| anyhow::anyhow!("pregeneration failed: {}", e))?;
        let summary = worker.await?;
        tracing::info!(
            synthesized = summary.synthesized,
            cached = summary.cached,
            failed = summary.failed,
            "Pregeneration complete"
        );
    } else {
        orchestrator
            .play_sentences(request, first_id, &JsonLineSink)
            .await
            .map_err(|e| anyhow::anyhow!("playback failed: {}", e))?;
    }

    runtime.shutdown();
    tracing::info!("VoxChat shutdown complete");
    Ok(())
}
