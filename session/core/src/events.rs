//! Surface Events
//!
//! Events sent from UI surfaces to the orchestrator. Surfaces report what
//! the user did; the orchestrator decides what it means for the session.

use serde::{Deserialize, Serialize};

/// Events from UI surface to orchestrator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    // ============================================
    // User Input Events
    // ============================================
    /// User pressed start on the landing page
    StartRequested,

    /// User picked a preference (local only, nothing is sent yet)
    PreferenceSelected {
        /// Preference name (`pop`, `rock`, `classical` or an alias)
        preference: String,
    },

    /// User confirmed the selected preference
    PreferenceConfirmed,

    /// User asked to start over from the summary
    RestartRequested,

    /// Raw navigation request by phase name
    NavigateTo {
        /// Target phase name
        phase: String,
    },

    // ============================================
    // Playback Events
    // ============================================
    /// The track finished playing
    PlaybackEnded,

    /// The track failed to load or play
    PlaybackFailed {
        /// What went wrong
        reason: String,
    },

    // ============================================
    // Demo / Lifecycle Events
    // ============================================
    /// Publish a simulated reading through the backend
    InjectReading {
        /// HRV in milliseconds
        hrv: f64,
        /// Heart rate, if known
        bpm: Option<f64>,
    },

    /// Surface is closing
    QuitRequested,
}
