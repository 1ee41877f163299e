use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use voice_coach::devices::{ConsoleRecognizer, ConsoleSynthesizer, FileCapture};
use voice_coach::{
    create_router, AppState, Collaborators, Config, ControlEvent, ConversationSession,
    HttpUploader, WebSocketTransport, WelcomeGate,
};

#[derive(Debug, Parser)]
#[command(name = "voice-coach", about = "Spoken practice conversation with an AI agent")]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/voice-coach")]
    config: String,

    /// Credential for the agent channel and uploads
    #[arg(long, env = "VOICE_COACH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// WAV file used as the microphone (silence if omitted)
    #[arg(long)]
    audio_file: Option<PathBuf>,

    /// Do not serve the HTTP control API
    #[arg(long)]
    no_http: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Voice Coach v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Agent channel: {}", cfg.agent.url);

    let uploader = HttpUploader::new(cfg.upload.clone(), args.token.clone().unwrap_or_default())
        .context("Failed to create upload client")?;

    let collaborators = Collaborators {
        capture: Box::new(FileCapture::new(
            args.audio_file.clone(),
            cfg.recording.sample_rate,
            cfg.recording.channels,
        )),
        recognizer: Box::new(ConsoleRecognizer::new()),
        synthesizer: Box::new(ConsoleSynthesizer::new(cfg.speech.words_per_minute)),
        transport: Box::new(WebSocketTransport::new(cfg.agent.url.clone())),
        uploader: Arc::new(uploader),
    };

    // One gate per process: the greeting is spoken once even across sessions
    let welcome = Arc::new(WelcomeGate::new());
    let mut session = ConversationSession::new(cfg.session_config(), collaborators, welcome);

    if !args.no_http {
        let router = create_router(AppState::new(session.events(), session.snapshot()));
        let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP API to {}", addr))?;
        info!("HTTP API listening on {}", addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("HTTP API stopped: {}", e);
            }
        });
    }

    let events = session.events();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, ending session");
            events.control(ControlEvent::End);
        }
    });

    if let Err(e) = session.start(args.token.as_deref()).await {
        error!("Session could not start: {}", e);
        if let Some(message) = session.error() {
            eprintln!("{}", message);
        }
        return Ok(());
    }

    let report = session.run().await;

    for failure in &report.errors {
        warn!("Teardown step failed: {}", failure);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    info!("Session {} ended, returning to dashboard", report.session_id);

    Ok(())
}
