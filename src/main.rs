use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eco_echo::{
    create_router, ActionComposer, ActionDraft, ActionList, ActionSubmissionPipeline, AppState,
    Config, EcoAssistant, LocalObjectStore, MemoryRecordStore, MicrophoneFactory,
    NatsRealtimeStore, PhotoFile, PipelineConfig, PreviewRegistry, RecordStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "eco-echo", about = "Log eco actions with photos and voice notes")]
struct Cli {
    /// Config file (without extension)
    #[arg(long, default_value = "config/eco-echo")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Compose and submit one action
    Log {
        #[arg(long, default_value = "")]
        text: String,
        /// Photo to attach
        #[arg(long)]
        photo: Option<PathBuf>,
        /// Record a voice note of this many seconds
        #[arg(long)]
        record_secs: Option<u64>,
    },
    /// Ask the eco assistant
    Ask { message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Signed in as {} ({})", cfg.user.display_name, cfg.user.id);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Log {
            text,
            photo,
            record_secs,
        } => log_action(cfg, text, photo, record_secs).await,
        Command::Ask { message } => ask(cfg, message).await,
    }
}

async fn build_pipeline(cfg: &Config) -> Result<Arc<ActionSubmissionPipeline>> {
    let memory = Arc::new(MemoryRecordStore::new());
    let records: Arc<dyn RecordStore> = match &cfg.realtime.nats_url {
        Some(url) => Arc::new(NatsRealtimeStore::connect(url, memory).await?),
        None => memory,
    };

    let objects = Arc::new(LocalObjectStore::new(
        &cfg.storage.root,
        &cfg.storage.public_base_url,
    ));

    let pipeline = ActionSubmissionPipeline::new(
        cfg.user.id.clone(),
        records,
        objects,
        ActionList::new(),
        PipelineConfig::from_storage(&cfg.storage),
    );

    pipeline.refresh().await?;
    pipeline.open_realtime().await?;

    Ok(Arc::new(pipeline))
}

async fn serve(cfg: Config) -> Result<()> {
    let pipeline = build_pipeline(&cfg).await?;
    let previews = PreviewRegistry::new();
    let assistant = EcoAssistant::new(
        Arc::clone(&previews),
        Duration::from_millis(cfg.assistant.thinking_delay_ms),
    );

    let mut state = AppState::new(pipeline, assistant, previews, cfg.storage.root.clone());
    state.max_photo_bytes = cfg.attachments.max_photo_bytes;
    state.goal_points = cfg.progress.goal_points;

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn log_action(
    cfg: Config,
    text: String,
    photo: Option<PathBuf>,
    record_secs: Option<u64>,
) -> Result<()> {
    let pipeline = build_pipeline(&cfg).await?;
    let microphone = MicrophoneFactory::create(&cfg.recording)?;
    let previews = PreviewRegistry::new();

    let mut composer = ActionComposer::new(microphone, Arc::clone(&previews))
        .with_photo_limit(cfg.attachments.max_photo_bytes);
    composer.set_text(text);

    if let Some(path) = photo {
        let file = PhotoFile::open(&path).await?;
        if let Err(e) = composer.attach_photo(file) {
            warn!("Please choose a photo under 5MB ({})", e);
        }
    }

    if let Some(secs) = record_secs {
        match composer.start_recording().await {
            Ok(()) => {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                let label = composer.recorder().elapsed_label();
                match composer.stop_recording().await {
                    Ok(_) => info!("Voice note added ({})", label),
                    Err(e) => warn!("{}", e.user_hint()),
                }
            }
            Err(e) => warn!("Recording failed: {}", e.user_hint()),
        }
    }

    match composer.submit(&pipeline).await {
        Ok(receipt) => {
            info!(
                "Action logged! You earned {} eco points",
                receipt.action.impact_score
            );
            for failure in &receipt.upload_failures {
                warn!("{:?} was not saved: {}", failure.kind, failure.reason);
            }
            println!("{}", serde_json::to_string_pretty(&receipt.action)?);
        }
        Err(e) if e.is_warning() => warn!("{}", e),
        Err(e) => return Err(e.into()),
    }

    let list = pipeline.list();
    info!(
        "{} actions, {} points, {}% of {} point goal",
        list.len().await,
        list.total_points().await,
        list.progress_percent(cfg.progress.goal_points).await,
        cfg.progress.goal_points
    );

    pipeline.close_realtime().await;

    Ok(())
}

async fn ask(cfg: Config, message: String) -> Result<()> {
    let previews = PreviewRegistry::new();
    let mut assistant = EcoAssistant::new(
        previews,
        Duration::from_millis(cfg.assistant.thinking_delay_ms),
    );

    let draft = ActionDraft::new(&message, None, None)?;
    let reply = assistant.ask(draft).await;
    println!("{}", reply.content);

    Ok(())
}
