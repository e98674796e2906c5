//! Readiness Barrier
//!
//! Gate that opens once a fresh HRV reading exists and the model has been
//! reported loaded for several consecutive polls.
//!
//! # Design Philosophy
//!
//! The barrier is pure state. It never touches the network or a timer; the
//! orchestrator feeds it poll responses as they arrive and acts on the
//! [`BarrierDecision`] it returns. That keeps the debounce and freshness
//! rules testable with plain values.
//!
//! ```text
//!   Polling ──both hold──▶ Confirming ──re-check loaded──▶ Fired
//!      ▲                       │
//!      └──re-check disagrees───┘
//!   (any stage) ──sensor failed──▶ Stopped
//! ```

use crate::backend::{HrvReading, ModelStatus, SensorStatus};

/// Debounce and freshness state for the two readiness conditions
#[derive(Clone, Debug, PartialEq)]
pub struct ReadinessState {
    /// A reading newer than the baseline has been seen
    pub hrv_ready: bool,
    /// The model has been loaded for enough consecutive polls
    pub model_ready: bool,
    /// Consecutive "loaded" polls
    pub model_confirm_count: u32,
    /// Last-modified marker of the reading present when polling started
    pub baseline_hrv_timestamp: Option<f64>,
    required_confirmations: u32,
}

impl ReadinessState {
    /// Fresh state against a captured baseline marker
    #[must_use]
    pub fn from_baseline(baseline_hrv_timestamp: Option<f64>, required_confirmations: u32) -> Self {
        Self {
            hrv_ready: false,
            model_ready: false,
            model_confirm_count: 0,
            baseline_hrv_timestamp,
            required_confirmations: required_confirmations.max(1),
        }
    }

    /// Consecutive polls needed before the model counts as ready
    #[must_use]
    pub fn required_confirmations(&self) -> u32 {
        self.required_confirmations
    }

    /// Feed one HRV poll; returns true on the poll that first makes it ready
    ///
    /// Once ready, HRV readiness stays latched for the rest of the barrier.
    pub fn observe_hrv(&mut self, reading: &HrvReading) -> bool {
        if self.hrv_ready || !reading.has_content() {
            return false;
        }

        let fresh = match (self.baseline_hrv_timestamp, reading.mtime) {
            (None, _) => true,
            (Some(baseline), Some(mtime)) => mtime > baseline,
            (Some(_), None) => false,
        };

        if fresh {
            self.hrv_ready = true;
        }
        fresh
    }

    /// Feed one model poll
    pub fn observe_model(&mut self, loaded: bool) {
        if loaded {
            self.model_confirm_count = self.model_confirm_count.saturating_add(1);
            if self.model_confirm_count >= self.required_confirmations {
                self.model_ready = true;
            }
        } else {
            self.reset_model();
        }
    }

    /// Both conditions hold
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.hrv_ready && self.model_ready
    }

    /// Drop model readiness and its confirm count
    pub fn reset_model(&mut self) {
        self.model_ready = false;
        self.model_confirm_count = 0;
    }
}

/// Where the barrier is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierStage {
    /// Collecting poll responses
    Polling,
    /// Both conditions held; waiting on the terminal model re-check
    Confirming,
    /// The barrier opened; nothing else is applied
    Fired,
    /// Stopped by a sensor failure or by the owning phase ending
    Stopped,
}

/// What the orchestrator should do after feeding the barrier
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BarrierDecision {
    /// Keep polling
    Continue,
    /// Issue the terminal model re-check
    Confirm,
    /// Open the barrier
    Fire,
    /// Sensor capture failed; abandon detection
    Abort {
        /// Text for the user
        reason: String,
    },
}

/// The readiness barrier driven by poll responses
#[derive(Clone, Debug)]
pub struct ReadinessBarrier {
    state: ReadinessState,
    stage: BarrierStage,
    ready_reading: Option<HrvReading>,
    model_message: Option<String>,
}

impl ReadinessBarrier {
    /// Start a barrier against the baseline marker captured at phase entry
    #[must_use]
    pub fn new(baseline_hrv_timestamp: Option<f64>, required_confirmations: u32) -> Self {
        Self {
            state: ReadinessState::from_baseline(baseline_hrv_timestamp, required_confirmations),
            stage: BarrierStage::Polling,
            ready_reading: None,
            model_message: None,
        }
    }

    /// Underlying condition state
    #[must_use]
    pub fn state(&self) -> &ReadinessState {
        &self.state
    }

    /// Current stage
    #[must_use]
    pub fn stage(&self) -> BarrierStage {
        self.stage
    }

    /// The reading that satisfied HRV readiness
    #[must_use]
    pub fn ready_reading(&self) -> Option<&HrvReading> {
        self.ready_reading.as_ref()
    }

    /// Most recent model status message
    #[must_use]
    pub fn model_message(&self) -> Option<&str> {
        self.model_message.as_deref()
    }

    fn accepts_polls(&self) -> bool {
        matches!(self.stage, BarrierStage::Polling | BarrierStage::Confirming)
    }

    fn decide(&mut self) -> BarrierDecision {
        if self.stage == BarrierStage::Polling && self.state.is_satisfied() {
            self.stage = BarrierStage::Confirming;
            return BarrierDecision::Confirm;
        }
        BarrierDecision::Continue
    }

    /// Apply a routine HRV poll
    pub fn apply_hrv(&mut self, reading: &HrvReading) -> BarrierDecision {
        if !self.accepts_polls() {
            return BarrierDecision::Continue;
        }
        if self.state.observe_hrv(reading) {
            self.ready_reading = Some(reading.clone());
        }
        self.decide()
    }

    /// Apply a routine model poll
    pub fn apply_model(&mut self, status: &ModelStatus) -> BarrierDecision {
        if !self.accepts_polls() {
            return BarrierDecision::Continue;
        }
        self.model_message.clone_from(&status.message);
        self.state.observe_model(status.loaded);
        if !status.loaded && self.stage == BarrierStage::Confirming {
            self.stage = BarrierStage::Polling;
        }
        self.decide()
    }

    /// Apply the terminal re-check response
    pub fn apply_confirmation(&mut self, status: &ModelStatus) -> BarrierDecision {
        if self.stage != BarrierStage::Confirming {
            return BarrierDecision::Continue;
        }
        if status.loaded && self.state.is_satisfied() {
            self.stage = BarrierStage::Fired;
            return BarrierDecision::Fire;
        }
        self.state.reset_model();
        self.stage = BarrierStage::Polling;
        BarrierDecision::Continue
    }

    /// The terminal re-check could not be completed
    ///
    /// Treated as "not ready yet": the next routine poll that finds both
    /// conditions holding issues a new re-check.
    pub fn confirmation_failed(&mut self) {
        if self.stage == BarrierStage::Confirming {
            self.stage = BarrierStage::Polling;
        }
    }

    /// Apply a sensor subprocess status
    pub fn apply_sensor(&mut self, status: &SensorStatus) -> BarrierDecision {
        if !self.accepts_polls() || !status.is_failed() {
            return BarrierDecision::Continue;
        }
        self.stage = BarrierStage::Stopped;
        let detail = status.error.as_deref().unwrap_or_default().trim();
        BarrierDecision::Abort {
            reason: format!("HRV measurement failed: {detail}"),
        }
    }

    /// Stop applying responses; idempotent
    pub fn stop(&mut self) {
        if self.stage != BarrierStage::Fired {
            self.stage = BarrierStage::Stopped;
        }
    }
}
