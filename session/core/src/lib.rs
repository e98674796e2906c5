//! HRV Session Core - Headless Biofeedback Session Orchestration
//!
//! This crate drives a guided biofeedback session: a sensor produces a
//! heart-rate-variability reading, a generative model produces an audio
//! track keyed off that reading and a music preference, and the listener's
//! physiological response is tracked while the track plays.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          UI Surfaces                              │
//! │     ┌─────────┐   ┌──────────┐   ┌──────────────────────────┐    │
//! │     │   CLI   │   │  Web UI  │   │   Headless / test rigs   │    │
//! │     └────┬────┘   └────┬─────┘   └────────────┬─────────────┘    │
//! │          └─────────────┴──────────────────────┘                  │
//! │                 SessionEvent (up)  SessionMessage (down)         │
//! └──────────────────────────────┼───────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼───────────────────────────────────┐
//! │                        SESSION CORE                               │
//! │  ┌───────────────────────────┴────────────────────────────────┐  │
//! │  │                      Orchestrator                           │  │
//! │  │  ┌───────────┐ ┌────────────┐ ┌────────────┐ ┌───────────┐ │  │
//! │  │  │ Readiness │ │ Generation │ │ Telemetry  │ │  Timer    │ │  │
//! │  │  │  Barrier  │ │   Poller   │ │  Tracker   │ │ Registry  │ │  │
//! │  │  └───────────┘ └────────────┘ └────────────┘ └───────────┘ │  │
//! │  └──────────────────────────────┬─────────────────────────────┘  │
//! │                          SessionBackend                           │
//! └──────────────────────────────────┼───────────────────────────────┘
//!                                    │ HTTP
//!                        sensor / model backend
//! ```
//!
//! # Timeline Model
//!
//! Everything runs on one logical timeline. Pollers and samplers are
//! fixed-period timers owned by a phase; their ticks and the responses of
//! the requests they fire arrive as [`signals::Signal`]s on the
//! orchestrator's own channel. A phase transition cancels every timer the
//! outgoing phase owns before the incoming phase starts its own, and every
//! late response is checked against the timer's epoch before it may touch
//! session state.
//!
//! # Module Overview
//!
//! - [`backend`]: backend abstraction and the HTTP client
//! - [`config`]: session configuration (defaults, TOML, environment)
//! - [`error`]: error types
//! - [`events`]: events from UI surfaces to the orchestrator
//! - [`generation`]: generation job tracking
//! - [`messages`]: messages from the orchestrator to UI surfaces
//! - [`orchestrator`]: the session state machine
//! - [`phase`]: session phases and their legal edges
//! - [`preference`]: music preferences
//! - [`readiness`]: the dual-condition readiness barrier
//! - [`scheduler`]: the phase-keyed timer registry
//! - [`signals`]: internal timer and response signals
//! - [`telemetry`]: before/after physiological tracking
//!
//! # No UI Dependencies
//!
//! This crate has no terminal or GUI dependencies. Surfaces render what
//! they are told through [`SessionMessage`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod generation;
pub mod messages;
pub mod orchestrator;
pub mod phase;
pub mod preference;
pub mod readiness;
pub mod scheduler;
pub mod signals;
pub mod telemetry;

// Re-exports for convenience
pub use backend::{
    HrvReading, HttpBackend, JobHandle, JobStatus, JobStatusReport, MeasurementParams,
    MeasurementStart, ModelStatus, PreferenceAck, SensorStatus, SessionBackend, SubmitOutcome,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, BackendSettings, PollingSettings,
    SessionConfig, TelemetrySettings,
};
pub use error::{BackendError, ConfigError};
pub use events::SessionEvent;
pub use generation::{GenerationJob, GenerationPoller, JobOutcome};
pub use messages::{NotifyLevel, SessionMessage};
pub use orchestrator::Orchestrator;
pub use phase::SessionPhase;
pub use preference::MusicPreference;
pub use readiness::{BarrierDecision, BarrierStage, ReadinessBarrier, ReadinessState};
pub use scheduler::{TimerKind, TimerOp, TimerRegistry};
pub use signals::{ModelPollPurpose, Signal};
pub use telemetry::{SessionSummary, TelemetrySample, TelemetryTracker};
