//! Internal Signals
//!
//! Everything that happens "later" reaches the orchestrator as a [`Signal`]
//! on its own channel: timer ticks from the [`crate::scheduler`] and the
//! responses of fire-and-forget backend requests. Each signal carries the
//! epoch of the timer that caused it, so a response that resolves after its
//! timer was cancelled can be recognized and dropped.

use crate::backend::{HrvReading, JobStatusReport, ModelStatus, SensorStatus};
use crate::error::BackendError;
use crate::scheduler::TimerKind;

/// Why a model status request was issued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelPollPurpose {
    /// Regular readiness poll
    Routine,
    /// Terminal re-check before the barrier fires
    DoubleCheck,
}

/// Internal signal delivered to the orchestrator loop
#[derive(Debug)]
pub enum Signal {
    /// A timer fired
    Tick {
        /// Which timer
        kind: TimerKind,
        /// Epoch of the timer instance
        epoch: u64,
    },

    /// Latest HRV reading for the readiness barrier
    HrvPolled {
        /// Readiness timer epoch
        epoch: u64,
        /// Backend response
        result: Result<HrvReading, BackendError>,
    },

    /// Model status for the readiness barrier
    ModelPolled {
        /// Readiness timer epoch
        epoch: u64,
        /// Routine poll or terminal re-check
        purpose: ModelPollPurpose,
        /// Backend response
        result: Result<ModelStatus, BackendError>,
    },

    /// Sensor subprocess status for the readiness barrier
    SensorPolled {
        /// Readiness timer epoch
        epoch: u64,
        /// Backend response
        result: Result<SensorStatus, BackendError>,
    },

    /// Generation job status
    JobPolled {
        /// Job poll timer epoch
        epoch: u64,
        /// Backend response
        result: Result<JobStatusReport, BackendError>,
    },

    /// Latest HRV reading for the telemetry sampler
    TelemetryPolled {
        /// Sampler timer epoch
        epoch: u64,
        /// Backend response
        result: Result<HrvReading, BackendError>,
    },
}

impl Signal {
    /// Timer kind whose liveness gates this signal
    #[must_use]
    pub fn timer_kind(&self) -> TimerKind {
        match self {
            Self::Tick { kind, .. } => *kind,
            Self::HrvPolled { .. } | Self::ModelPolled { .. } | Self::SensorPolled { .. } => {
                TimerKind::ReadinessPoll
            }
            Self::JobPolled { .. } => TimerKind::JobPoll,
            Self::TelemetryPolled { .. } => TimerKind::TelemetrySample,
        }
    }

    /// Epoch of the timer instance that caused this signal
    #[must_use]
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Tick { epoch, .. }
            | Self::HrvPolled { epoch, .. }
            | Self::ModelPolled { epoch, .. }
            | Self::SensorPolled { epoch, .. }
            | Self::JobPolled { epoch, .. }
            | Self::TelemetryPolled { epoch, .. } => *epoch,
        }
    }
}
