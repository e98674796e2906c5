//! Timer Registry
//!
//! Fixed-period timers keyed by kind, each owned by one session phase.
//!
//! # Design Philosophy
//!
//! Every poller and sampler in a session is just a timer whose ticks the
//! orchestrator interprets. Keeping them all in one registry makes the
//! phase teardown rule a single call: `cancel_all(phase)` stops everything
//! the outgoing phase started, and the journal records the order in which
//! timers were stopped and started so tests can assert on it.
//!
//! Cancellation aborts the tick task, but a tick or response may already be
//! queued. Each timer instance gets a fresh epoch, and [`TimerRegistry::is_live`]
//! is the check every queued signal goes through before it may act.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::phase::SessionPhase;
use crate::signals::Signal;

/// Kinds of timer a session runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Readiness barrier poll (Detecting)
    ReadinessPoll,
    /// Generation job status poll (Loading)
    JobPoll,
    /// Loading ambient progress ticker (Loading)
    GenerationProgress,
    /// Telemetry sampler (Playing)
    TelemetrySample,
}

impl TimerKind {
    /// Every kind
    pub const ALL: [TimerKind; 4] = [
        TimerKind::ReadinessPoll,
        TimerKind::JobPoll,
        TimerKind::GenerationProgress,
        TimerKind::TelemetrySample,
    ];

    /// Phase that owns timers of this kind
    #[must_use]
    pub fn owner(self) -> SessionPhase {
        match self {
            Self::ReadinessPoll => SessionPhase::Detecting,
            Self::JobPoll | Self::GenerationProgress => SessionPhase::Loading,
            Self::TelemetrySample => SessionPhase::Playing,
        }
    }

    /// Name for logs
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadinessPoll => "readiness_poll",
            Self::JobPoll => "job_poll",
            Self::GenerationProgress => "generation_progress",
            Self::TelemetrySample => "telemetry_sample",
        }
    }
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Journal entry for a registry operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOp {
    /// A timer instance was started
    Started {
        /// Kind
        kind: TimerKind,
        /// Epoch assigned to the instance
        epoch: u64,
    },
    /// A timer instance was cancelled
    Cancelled {
        /// Kind
        kind: TimerKind,
        /// Epoch of the cancelled instance
        epoch: u64,
    },
}

impl TimerOp {
    /// Kind this operation applied to
    #[must_use]
    pub fn kind(self) -> TimerKind {
        match self {
            Self::Started { kind, .. } | Self::Cancelled { kind, .. } => kind,
        }
    }
}

struct ActiveTimer {
    epoch: u64,
    handle: JoinHandle<()>,
}

/// Registry of live timers, at most one per kind
pub struct TimerRegistry {
    signal_tx: mpsc::Sender<Signal>,
    active: BTreeMap<TimerKind, ActiveTimer>,
    next_epoch: u64,
    journal: Vec<TimerOp>,
}

impl TimerRegistry {
    /// Create a registry whose timers tick into `signal_tx`
    #[must_use]
    pub fn new(signal_tx: mpsc::Sender<Signal>) -> Self {
        Self {
            signal_tx,
            active: BTreeMap::new(),
            next_epoch: 0,
            journal: Vec::new(),
        }
    }

    /// Start a timer of `kind`, replacing any live instance
    ///
    /// The first tick arrives one full `period` after this call. Returns the
    /// epoch of the new instance, or `None` without touching the registry
    /// when `period` is zero.
    pub fn start(&mut self, kind: TimerKind, period: Duration) -> Option<u64> {
        if period.is_zero() {
            tracing::error!(kind = %kind, "Refusing to start a timer with a zero period");
            return None;
        }
        self.cancel(kind);

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        let tx = self.signal_tx.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Signal::Tick { kind, epoch }).await.is_err() {
                    break;
                }
            }
        });

        self.active.insert(kind, ActiveTimer { epoch, handle });
        self.journal.push(TimerOp::Started { kind, epoch });
        tracing::debug!(kind = %kind, epoch, period_ms = period.as_millis(), "Timer started");
        Some(epoch)
    }

    /// Cancel the live timer of `kind`, if any
    ///
    /// Idempotent. Returns whether a timer was running.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.active.remove(&kind) {
            Some(timer) => {
                timer.handle.abort();
                self.journal.push(TimerOp::Cancelled {
                    kind,
                    epoch: timer.epoch,
                });
                tracing::debug!(kind = %kind, epoch = timer.epoch, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every timer owned by `phase`, returning how many were live
    pub fn cancel_all(&mut self, phase: SessionPhase) -> usize {
        let owned: Vec<TimerKind> = self
            .active
            .keys()
            .copied()
            .filter(|kind| kind.owner() == phase)
            .collect();
        owned.into_iter().filter(|kind| self.cancel(*kind)).count()
    }

    /// Cancel every timer regardless of owner
    pub fn shutdown(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
    }

    /// Whether `epoch` is the live instance of `kind`
    #[must_use]
    pub fn is_live(&self, kind: TimerKind, epoch: u64) -> bool {
        self.active.get(&kind).is_some_and(|t| t.epoch == epoch)
    }

    /// Epoch of the live instance of `kind`
    #[must_use]
    pub fn epoch(&self, kind: TimerKind) -> Option<u64> {
        self.active.get(&kind).map(|t| t.epoch)
    }

    /// Kinds with a live timer, in a stable order
    #[must_use]
    pub fn active_kinds(&self) -> Vec<TimerKind> {
        self.active.keys().copied().collect()
    }

    /// Operations performed so far, oldest first
    #[must_use]
    pub fn journal(&self) -> &[TimerOp] {
        &self.journal
    }

    /// Forget recorded operations
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for timer in self.active.values() {
            timer.handle.abort();
        }
    }
}
