//! Session Messages
//!
//! Messages sent from the orchestrator to UI surfaces.
//!
//! # Design Philosophy
//!
//! Surfaces are renderers. They show the phase they are told to show, play
//! the track they are handed, and draw the telemetry they receive. None of
//! them decides when a phase ends; that belongs to the orchestrator.

use serde::{Deserialize, Serialize};

use crate::phase::SessionPhase;
use crate::telemetry::{SessionSummary, TelemetrySample};

/// Messages from orchestrator to UI surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionMessage {
    // ============================================
    // Phase Directives
    // ============================================
    /// The active phase changed
    PhaseChanged {
        /// Phase that was left
        from: SessionPhase,
        /// Phase now active
        to: SessionPhase,
    },

    /// Readiness barrier progress (Detecting phase)
    ReadinessProgress {
        /// A fresh HRV reading arrived
        hrv_ready: bool,
        /// Model load confirmed
        model_ready: bool,
        /// Consecutive "loaded" polls so far
        model_confirm_count: u32,
        /// Latest model status message, if any
        model_message: Option<String>,
    },

    /// Generation progress text (Loading phase)
    GenerationProgress {
        /// Seconds since submission
        elapsed_secs: u64,
        /// Text to display
        status_text: String,
    },

    /// Loading-phase ambient sequence started
    AmbientStarted,

    /// Loading-phase ambient sequence stopped
    AmbientStopped,

    // ============================================
    // Playback Directives
    // ============================================
    /// A generated track is ready to play
    PlaybackReady {
        /// Backend result id
        result_id: String,
        /// URL the surface can stream from
        audio_url: String,
    },

    /// Start the reactive visualization loop
    VisualizationStarted,

    /// Stop the reactive visualization loop
    VisualizationStopped,

    /// A telemetry sample was recorded
    TelemetrySampled {
        /// The sample
        sample: TelemetrySample,
    },

    /// Before/after summary, sent once playback ends
    Summary {
        /// The summary
        summary: SessionSummary,
    },

    // ============================================
    // System Messages
    // ============================================
    /// Dismissible notice
    Notify {
        /// Severity
        level: NotifyLevel,
        /// Text
        message: String,
    },

    /// Orchestrator shut down
    Quit,
}

/// Notice severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Something needs attention but the session continues
    Warning,
    /// An operation failed
    Error,
}

impl std::fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Status text for a generation that has been running `elapsed_secs`
#[must_use]
pub fn generation_status_text(elapsed_secs: u64) -> String {
    match elapsed_secs {
        0..=10 => "Generating music...".to_string(),
        11..=30 => format!("Generating music... ({elapsed_secs}s)"),
        31..=60 => format!("Generating music... ({elapsed_secs}s) please be patient"),
        _ => format!("Generating music... ({elapsed_secs}s) this is taking longer than usual"),
    }
}
