//! HRV Session CLI - Headless Session Surface
//!
//! Drives one biofeedback session end to end against a running sensor/model
//! backend: starts detection, confirms a preference once the readiness
//! barrier opens, waits for the generated track, "listens" for a while and
//! prints the before/after summary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (backend on localhost:5001, pop, 30 s of playback)
//! hrv-session
//!
//! # Demo mode without sensor hardware
//! hrv-session --simulate-hrv 42 --simulate-bpm 74 --preference classical
//!
//! # Keep the generated track
//! hrv-session --save-audio /tmp/session.wav
//!
//! # Machine-readable output
//! hrv-session --json
//!
//! # Verbose logging
//! RUST_LOG=debug hrv-session
//! ```
//!
//! # Environment Variables
//!
//! - `HRV_SESSION_CONFIG`: config file path
//! - `HRV_SESSION_*`: configuration overrides (see `SessionConfig::with_overrides`)
//! - `RUST_LOG`: log filter

mod autopilot;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use hrv_session_core::{
    load_config, HttpBackend, NotifyLevel, Orchestrator, SessionBackend, SessionEvent,
    SessionMessage,
};

use autopilot::{Action, Autopilot, SessionOutcome};

/// HRV Session - run one guided biofeedback session from the terminal
#[derive(Parser, Debug)]
#[command(name = "hrv-session")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "HRV_SESSION_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and environment)
    #[arg(short = 'u', long, value_name = "URL")]
    base_url: Option<String>,

    /// Sensor serial port (overrides config and environment)
    #[arg(long, value_name = "PATH")]
    port: Option<String>,

    /// Music preference: pop, rock or classical
    #[arg(short = 'p', long, default_value = "pop")]
    preference: String,

    /// Publish a simulated HRV reading instead of waiting for the sensor
    #[arg(long, value_name = "MS")]
    simulate_hrv: Option<f64>,

    /// Heart rate to publish with --simulate-hrv
    #[arg(long, value_name = "BPM", requires = "simulate_hrv")]
    simulate_bpm: Option<f64>,

    /// Seconds of playback before the session ends
    #[arg(short = 'l', long, default_value_t = 30)]
    listen_secs: u64,

    /// Write the generated track to this file
    #[arg(long, value_name = "FILE")]
    save_audio: Option<PathBuf>,

    /// Generation attempts before giving up
    #[arg(long, default_value_t = 1)]
    max_attempts: u32,

    /// Print every message as a JSON line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("hrv_session_core=info,hrv_session=info")
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &args.base_url {
        config.backend.base_url.clone_from(url);
    }
    if let Some(port) = &args.port {
        config.sensor.port.clone_from(port);
    }
    config.validate().context("Invalid configuration")?;

    let backend = HttpBackend::from_config(&config).context("Failed to create backend client")?;
    let downloads = backend.clone();
    info!(backend = %backend.base_url(), "Starting session");

    let (msg_tx, mut msg_rx) = mpsc::channel::<SessionMessage>(config.channel_capacity);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(config.channel_capacity);

    let mut orchestrator =
        Orchestrator::new(backend, config, msg_tx).context("Invalid configuration")?;
    let session = tokio::spawn(async move {
        orchestrator.run(event_rx).await;
    });

    event_tx
        .send(SessionEvent::StartRequested)
        .await
        .context("Orchestrator stopped before the session started")?;
    if let Some(hrv) = args.simulate_hrv {
        event_tx
            .send(SessionEvent::InjectReading {
                hrv,
                bpm: args.simulate_bpm,
            })
            .await
            .context("Orchestrator stopped before the reading was injected")?;
    }

    let mut autopilot = Autopilot::new(args.preference.clone(), args.max_attempts);

    loop {
        tokio::select! {
            msg = msg_rx.recv() => {
                let Some(msg) = msg else { break };
                render(&msg, args.json);

                for action in autopilot.react(&msg) {
                    match action {
                        Action::Send(event) => {
                            if event_tx.send(event).await.is_err() {
                                warn!("Orchestrator stopped, event dropped");
                            }
                        }
                        Action::Listen { result_id } => {
                            let tx = event_tx.clone();
                            let downloads = downloads.clone();
                            let save_to = args.save_audio.clone();
                            let listen = Duration::from_secs(args.listen_secs);
                            tokio::spawn(async move {
                                if let Some(path) = save_to {
                                    if let Err(e) = save_audio(&downloads, &result_id, &path).await {
                                        warn!(error = %e, "Could not save audio");
                                    }
                                }
                                tokio::time::sleep(listen).await;
                                if tx.send(SessionEvent::PlaybackEnded).await.is_err() {
                                    warn!("Orchestrator stopped before playback ended");
                                }
                            });
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                if event_tx.send(SessionEvent::QuitRequested).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(event_tx);
    if let Err(e) = session.await {
        warn!(error = %e, "Session task ended abnormally");
    }

    match autopilot.outcome() {
        Some(SessionOutcome::Completed(summary)) => {
            if !args.json {
                println!();
                println!("Session summary");
                println!(
                    "  HRV: {:.0} ms -> {:.0} ms ({:+.0})",
                    summary.start_hrv,
                    summary.end_hrv,
                    summary.hrv_delta()
                );
                println!(
                    "  BPM: {:.0} -> {:.0} ({:+.0})",
                    summary.start_bpm,
                    summary.end_bpm,
                    summary.bpm_delta()
                );
            }
            Ok(())
        }
        Some(SessionOutcome::Aborted(reason)) => bail!("Session aborted: {reason}"),
        None => bail!("Session interrupted"),
    }
}

/// Download a generated track to `path`
async fn save_audio(backend: &HttpBackend, result_id: &str, path: &Path) -> Result<()> {
    let bytes = backend
        .fetch_audio(result_id)
        .await
        .with_context(|| format!("Failed to download track {result_id}"))?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Track saved");
    Ok(())
}

/// Print a message for a human, or as a JSON line
fn render(msg: &SessionMessage, json: bool) {
    if json {
        match serde_json::to_string(msg) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Could not serialize message"),
        }
        return;
    }

    match msg {
        SessionMessage::PhaseChanged { to, .. } => println!("== {} ==", to.label()),
        SessionMessage::Notify { level, message } => match level {
            NotifyLevel::Info => println!("   {message}"),
            NotifyLevel::Warning => eprintln!("!! {message}"),
            NotifyLevel::Error => eprintln!("xx {message}"),
        },
        SessionMessage::ReadinessProgress {
            hrv_ready,
            model_ready,
            model_confirm_count,
            model_message,
        } => {
            let hrv = if *hrv_ready { "ready" } else { "waiting" };
            let model = if *model_ready {
                "ready".to_string()
            } else {
                format!(
                    "{} ({model_confirm_count})",
                    model_message.as_deref().unwrap_or("loading")
                )
            };
            println!("   HRV: {hrv} | model: {model}");
        }
        SessionMessage::GenerationProgress {
            elapsed_secs,
            status_text,
        } => {
            if elapsed_secs % 5 == 0 {
                println!("   {status_text}");
            }
        }
        SessionMessage::PlaybackReady { audio_url, .. } => println!("   Track ready: {audio_url}"),
        SessionMessage::TelemetrySampled { sample } => {
            let marker = if sample.placeholder {
                " (no reading)"
            } else if sample.bpm_estimated {
                " (bpm estimated)"
            } else {
                ""
            };
            println!(
                "   HRV {:.0} ms, {:.0} bpm{marker}",
                sample.hrv_ms, sample.bpm
            );
        }
        SessionMessage::AmbientStarted
        | SessionMessage::AmbientStopped
        | SessionMessage::VisualizationStarted
        | SessionMessage::VisualizationStopped
        | SessionMessage::Summary { .. }
        | SessionMessage::Quit => {}
    }
}
