//! Orchestrator - The Session State Machine
//!
//! The Orchestrator owns everything mutable about a session: the current
//! phase, the timers each phase runs, the readiness barrier, the generation
//! job and the telemetry tracker. Surfaces talk to it through
//! [`SessionEvent`] and listen to [`SessionMessage`].
//!
//! # Design Philosophy
//!
//! There is one timeline. Events from the surface and [`Signal`]s from
//! timers and in-flight requests are handled one at a time by the same task,
//! so nothing needs a lock. What remains is ordering, and that is handled by
//! two rules:
//!
//! - A transition tears down every timer the outgoing phase owns before the
//!   incoming phase starts its own.
//! - Every signal is checked against the live epoch of its timer before it
//!   may touch session state. A response to a cancelled poll is dropped.
//!
//! Phase entry hooks never transition directly. When entering a phase
//! decides the session must move on (a synchronous generation result, a
//! failed capture start), it records a pending transition that is applied
//! once the current transition has finished. Transitions never nest.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::backend::{MeasurementStart, SessionBackend, SubmitOutcome};
use crate::config::SessionConfig;
use crate::error::{BackendError, ConfigError};
use crate::events::SessionEvent;
use crate::generation::{GenerationPoller, JobOutcome};
use crate::messages::{generation_status_text, NotifyLevel, SessionMessage};
use crate::phase::SessionPhase;
use crate::preference::MusicPreference;
use crate::readiness::{BarrierDecision, BarrierStage, ReadinessBarrier, ReadinessState};
use crate::scheduler::{TimerKind, TimerRegistry};
use crate::signals::{ModelPollPurpose, Signal};
use crate::telemetry::TelemetryTracker;

/// Capacity of the internal signal channel
const SIGNAL_CHANNEL_CAPACITY: usize = 256;

/// The Orchestrator - headless session state machine
pub struct Orchestrator<B: SessionBackend> {
    /// Configuration
    config: SessionConfig,
    /// Sensor/model backend
    backend: Arc<B>,
    /// Active phase
    phase: SessionPhase,
    /// Channel to send messages to the UI surface
    tx: mpsc::Sender<SessionMessage>,
    /// Sender half handed to timers and in-flight requests
    signal_tx: mpsc::Sender<Signal>,
    /// Timer ticks and request responses
    signal_rx: mpsc::Receiver<Signal>,
    /// Live timers
    timers: TimerRegistry,
    /// Readiness barrier (Detecting only)
    barrier: Option<ReadinessBarrier>,
    /// Enqueued generation job
    generation: GenerationPoller,
    /// A submission is outstanding; blocks further submits
    generation_in_progress: bool,
    /// When the current generation was submitted
    generation_started: Option<Instant>,
    /// Ambient audio was started on Loading entry
    ambient_playing: bool,
    /// Preference picked by the listener
    selected_preference: Option<MusicPreference>,
    /// Result id of the generated track
    result_id: Option<String>,
    /// Playback finished and the summary was sent
    playback_ended: bool,
    /// Before/after tracking
    telemetry: TelemetryTracker,
    /// Transition requested by a phase hook or signal handler
    pending_transition: Option<SessionPhase>,
    /// Cleared by `QuitRequested`
    running: bool,
}

impl<B: SessionBackend + 'static> Orchestrator<B> {
    /// Create an orchestrator in the `Initial` phase
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation, for
    /// example a zero polling interval.
    pub fn new(
        backend: B,
        config: SessionConfig,
        tx: mpsc::Sender<SessionMessage>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let timers = TimerRegistry::new(signal_tx.clone());
        let telemetry = TelemetryTracker::new(config.telemetry.clone());

        Ok(Self {
            config,
            backend: Arc::new(backend),
            phase: SessionPhase::Initial,
            tx,
            signal_tx,
            signal_rx,
            timers,
            barrier: None,
            generation: GenerationPoller::new(),
            generation_in_progress: false,
            generation_started: None,
            ambient_playing: false,
            selected_preference: None,
            result_id: None,
            playback_ended: false,
            telemetry,
            pending_transition: None,
            running: true,
        })
    }

    /// Active phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Configuration in use
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Readiness condition state while detecting
    pub fn readiness(&self) -> Option<&ReadinessState> {
        self.barrier.as_ref().map(ReadinessBarrier::state)
    }

    /// Readiness barrier stage while detecting
    pub fn barrier_stage(&self) -> Option<BarrierStage> {
        self.barrier.as_ref().map(ReadinessBarrier::stage)
    }

    /// Generation job tracker
    pub fn generation(&self) -> &GenerationPoller {
        &self.generation
    }

    /// Whether a generation submission is outstanding
    pub fn generation_in_progress(&self) -> bool {
        self.generation_in_progress
    }

    /// Preference picked by the listener
    pub fn selected_preference(&self) -> Option<MusicPreference> {
        self.selected_preference
    }

    /// Result id of the generated track
    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
    }

    /// Telemetry tracker
    pub fn telemetry(&self) -> &TelemetryTracker {
        &self.telemetry
    }

    /// Timer registry
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Forget the timer journal recorded so far
    pub fn clear_timer_journal(&mut self) {
        self.timers.clear_journal();
    }

    /// Whether the run loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    // ============================================
    // Surface Events
    // ============================================

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SessionEvent) {
        tracing::debug!(phase = %self.phase, event = ?event, "Handling surface event");

        match event {
            SessionEvent::StartRequested => {
                if self.phase == SessionPhase::Initial {
                    self.transition_to(SessionPhase::Detecting).await;
                } else {
                    tracing::debug!(phase = %self.phase, "Start ignored outside the initial phase");
                }
            }

            SessionEvent::PreferenceSelected { preference } => {
                self.select_preference(&preference).await;
            }

            SessionEvent::PreferenceConfirmed => {
                self.confirm_preference().await;
            }

            SessionEvent::PlaybackEnded => {
                self.end_playback().await;
            }

            SessionEvent::PlaybackFailed { reason } => {
                tracing::warn!(phase = %self.phase, reason = %reason, "Playback failed");
                self.notify(NotifyLevel::Error, format!("Audio playback failed: {reason}"))
                    .await;
            }

            SessionEvent::RestartRequested => {
                if self.phase == SessionPhase::Playing {
                    self.transition_to(SessionPhase::Initial).await;
                } else {
                    tracing::debug!(phase = %self.phase, "Restart ignored outside playback");
                }
            }

            SessionEvent::NavigateTo { phase } => {
                self.transition_to_name(&phase).await;
            }

            SessionEvent::InjectReading { hrv, bpm } => {
                if let Err(e) = self.backend.inject_reading(hrv, bpm).await {
                    tracing::warn!(error = %e, "Simulated reading rejected");
                    self.notify(
                        NotifyLevel::Warning,
                        format!("Could not inject simulated reading: {}", e.user_message()),
                    )
                    .await;
                } else {
                    tracing::info!(hrv, bpm = ?bpm, "Simulated reading injected");
                }
            }

            SessionEvent::QuitRequested => {
                self.shutdown().await;
            }
        }

        self.flush_pending().await;
    }

    async fn select_preference(&mut self, raw: &str) {
        if self.phase != SessionPhase::PreferenceSelection {
            tracing::debug!(phase = %self.phase, "Preference selection ignored");
            return;
        }
        match MusicPreference::parse(raw) {
            Some(preference) => {
                tracing::info!(preference = %preference, "Preference selected");
                self.selected_preference = Some(preference);
            }
            None => {
                self.notify(
                    NotifyLevel::Warning,
                    format!("Unsupported music preference: {raw}"),
                )
                .await;
            }
        }
    }

    async fn confirm_preference(&mut self) {
        if self.phase != SessionPhase::PreferenceSelection {
            tracing::debug!(phase = %self.phase, "Preference confirmation ignored");
            return;
        }
        let Some(preference) = self.selected_preference else {
            self.notify(NotifyLevel::Warning, "Please select a music preference first")
                .await;
            return;
        };
        if self.generation_in_progress {
            tracing::warn!("Generation already in progress, confirmation ignored");
            return;
        }

        match self.backend.confirm_preference(preference).await {
            Ok(ack) if ack.success => {
                tracing::info!(preference = %preference, "Preference persisted");
            }
            Ok(ack) => {
                let reason = ack.error.unwrap_or_else(|| "unknown error".to_string());
                tracing::warn!(preference = %preference, reason = %reason, "Preference not persisted");
                self.notify(
                    NotifyLevel::Warning,
                    format!("Could not save preference: {reason}"),
                )
                .await;
            }
            Err(e) => {
                tracing::warn!(preference = %preference, error = %e, "Preference confirmation failed");
                self.notify(
                    NotifyLevel::Warning,
                    format!("Could not save preference: {}", e.user_message()),
                )
                .await;
            }
        }

        self.transition_to(SessionPhase::Loading).await;
    }

    async fn end_playback(&mut self) {
        if self.phase != SessionPhase::Playing || self.playback_ended {
            tracing::debug!(phase = %self.phase, "Playback end ignored");
            return;
        }
        self.playback_ended = true;
        self.timers.cancel(TimerKind::TelemetrySample);

        let summary = self.telemetry.compute_summary();
        self.send(SessionMessage::Summary { summary }).await;
    }

    async fn shutdown(&mut self) {
        tracing::info!(phase = %self.phase, "Orchestrator shutting down");
        self.timers.shutdown();
        if let Some(barrier) = self.barrier.as_mut() {
            barrier.stop();
        }
        self.generation.cancel();
        self.pending_transition = None;
        self.running = false;
        self.send(SessionMessage::Quit).await;
    }

    // ============================================
    // Run Loop
    // ============================================

    /// Process surface events and internal signals until quit
    ///
    /// A closed event channel is treated as a quit request.
    pub async fn run(&mut self, mut events: mpsc::Receiver<SessionEvent>) {
        while self.running {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::info!("Surface disconnected");
                        self.shutdown().await;
                    }
                },
                Some(signal) = self.signal_rx.recv() => {
                    self.process_signal(signal).await;
                }
            }
        }
    }

    /// Wait for the next internal signal and process it
    ///
    /// Returns `false` once no more signals can arrive.
    pub async fn step(&mut self) -> bool {
        match self.signal_rx.recv().await {
            Some(signal) => {
                self.process_signal(signal).await;
                true
            }
            None => false,
        }
    }

    // ============================================
    // Transitions
    // ============================================

    /// Move to `target` if the edge is legal
    ///
    /// Illegal edges are ignored. Returns whether the requested transition
    /// happened; transitions requested by entry hooks follow it before this
    /// returns.
    pub async fn transition_to(&mut self, target: SessionPhase) -> bool {
        let applied = self.apply_transition(target).await;
        if applied {
            while let Some(next) = self.pending_transition.take() {
                if !self.apply_transition(next).await {
                    break;
                }
            }
        }
        applied
    }

    /// Move to the phase named `name`; unknown names are ignored
    pub async fn transition_to_name(&mut self, name: &str) -> bool {
        match SessionPhase::parse(name) {
            Some(target) => self.transition_to(target).await,
            None => {
                tracing::debug!(name = %name, "Navigation to unknown phase ignored");
                false
            }
        }
    }

    fn request_transition(&mut self, target: SessionPhase) {
        tracing::debug!(from = %self.phase, to = %target, "Transition requested");
        self.pending_transition = Some(target);
    }

    async fn flush_pending(&mut self) {
        if let Some(target) = self.pending_transition.take() {
            self.transition_to(target).await;
        }
    }

    async fn apply_transition(&mut self, target: SessionPhase) -> bool {
        let from = self.phase;
        if !self.running || !from.can_transition_to(target) {
            tracing::debug!(from = %from, to = %target, "Invalid transition ignored");
            return false;
        }

        self.exit_phase(from).await;
        self.phase = target;
        tracing::info!(from = %from, to = %target, "Phase transition");
        self.send(SessionMessage::PhaseChanged { from, to: target })
            .await;
        self.enter_phase(target).await;
        true
    }

    async fn exit_phase(&mut self, phase: SessionPhase) {
        let cancelled = self.timers.cancel_all(phase);
        tracing::debug!(phase = %phase, cancelled, "Phase timers cancelled");

        match phase {
            SessionPhase::Detecting => {
                if let Some(mut barrier) = self.barrier.take() {
                    barrier.stop();
                }
            }
            SessionPhase::Loading => {
                self.generation.cancel();
                self.generation_in_progress = false;
                self.generation_started = None;
                if std::mem::take(&mut self.ambient_playing) {
                    self.send(SessionMessage::AmbientStopped).await;
                }
            }
            SessionPhase::Playing => {
                self.send(SessionMessage::VisualizationStopped).await;
            }
            SessionPhase::Initial | SessionPhase::PreferenceSelection => {}
        }
    }

    async fn enter_phase(&mut self, phase: SessionPhase) {
        match phase {
            SessionPhase::Initial => {
                self.selected_preference = None;
                self.result_id = None;
                self.playback_ended = false;
            }
            SessionPhase::Detecting => self.enter_detecting().await,
            SessionPhase::PreferenceSelection => {}
            SessionPhase::Loading => self.enter_loading().await,
            SessionPhase::Playing => self.enter_playing().await,
        }
    }

    async fn enter_detecting(&mut self) {
        self.telemetry.reset();

        match self.backend.start_measurement(&self.config.sensor).await {
            Ok(MeasurementStart::Started) => {
                tracing::info!(port = %self.config.sensor.port, "HRV measurement started");
            }
            Ok(MeasurementStart::AlreadyRunning) => {
                tracing::info!("HRV measurement already running");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start HRV measurement");
                self.notify(
                    NotifyLevel::Error,
                    format!("Failed to start HRV measurement: {}", e.user_message()),
                )
                .await;
                self.request_transition(SessionPhase::Initial);
                return;
            }
        }

        let baseline = match self.backend.latest_hrv().await {
            Ok(reading) if reading.exists => reading.mtime,
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Baseline HRV read failed, treating as absent");
                None
            }
        };
        tracing::debug!(baseline = ?baseline, "Readiness baseline captured");

        self.barrier = Some(ReadinessBarrier::new(
            baseline,
            self.config.polling.model_confirmations,
        ));
        self.timers.start(
            TimerKind::ReadinessPoll,
            self.config.polling.readiness_interval(),
        );
        self.send_readiness_progress().await;
    }

    async fn enter_loading(&mut self) {
        let Some(preference) = self.selected_preference else {
            self.notify(NotifyLevel::Warning, "Please select a music preference first")
                .await;
            self.request_transition(SessionPhase::PreferenceSelection);
            return;
        };

        self.send(SessionMessage::AmbientStarted).await;
        self.ambient_playing = true;
        self.generation_started = Some(Instant::now());
        self.timers.start(
            TimerKind::GenerationProgress,
            self.config.polling.progress_interval(),
        );
        self.send(SessionMessage::GenerationProgress {
            elapsed_secs: 0,
            status_text: generation_status_text(0),
        })
        .await;

        if self.generation_in_progress {
            tracing::warn!("Generation already in progress, not submitting again");
            return;
        }
        self.generation_in_progress = true;

        tracing::info!(preference = %preference, "Submitting generation request");
        match self.backend.submit_generation(preference).await {
            Ok(SubmitOutcome::Immediate(result_id)) => {
                self.finish_generation(JobOutcome::Completed { result_id })
                    .await;
            }
            Ok(SubmitOutcome::Enqueued(handle)) => {
                tracing::info!(job_id = ?handle.id(), "Generation enqueued");
                self.generation.begin(handle);
                self.timers
                    .start(TimerKind::JobPoll, self.config.polling.job_interval());
            }
            Err(e) => {
                tracing::error!(error = %e, "Generation submission failed");
                self.finish_generation(JobOutcome::Failed {
                    error: e.user_message(),
                })
                .await;
            }
        }
    }

    async fn enter_playing(&mut self) {
        let Some(result_id) = self.result_id.clone() else {
            self.notify(NotifyLevel::Warning, "No generated track to play")
                .await;
            self.request_transition(SessionPhase::Initial);
            return;
        };

        self.playback_ended = false;
        let audio_url = self.backend.audio_url(&result_id);
        self.send(SessionMessage::PlaybackReady {
            result_id,
            audio_url,
        })
        .await;
        self.send(SessionMessage::VisualizationStarted).await;
        self.timers.start(
            TimerKind::TelemetrySample,
            self.config.telemetry.sample_interval(),
        );
    }

    async fn finish_generation(&mut self, outcome: JobOutcome) {
        self.timers.cancel(TimerKind::JobPoll);
        self.generation_in_progress = false;

        match outcome {
            JobOutcome::Completed { result_id } => {
                tracing::info!(result_id = %result_id, "Generation completed");
                self.result_id = Some(result_id);
                self.request_transition(SessionPhase::Playing);
            }
            JobOutcome::Failed { error } => {
                tracing::error!(error = %error, "Generation failed");
                self.notify(NotifyLevel::Error, error).await;
                self.request_transition(SessionPhase::PreferenceSelection);
            }
        }
    }

    // ============================================
    // Internal Signals
    // ============================================

    async fn process_signal(&mut self, signal: Signal) {
        let kind = signal.timer_kind();
        let epoch = signal.epoch();
        if !self.timers.is_live(kind, epoch) {
            tracing::trace!(kind = %kind, epoch, "Dropping stale signal");
            return;
        }

        match signal {
            Signal::Tick { kind, epoch } => self.on_tick(kind, epoch).await,

            Signal::HrvPolled { result, .. } => match result {
                Ok(reading) => {
                    let decision = self
                        .barrier
                        .as_mut()
                        .map_or(BarrierDecision::Continue, |b| b.apply_hrv(&reading));
                    self.on_barrier_decision(decision, epoch).await;
                    self.send_readiness_progress().await;
                }
                Err(e) => log_poll_error("HRV poll", &e),
            },

            Signal::ModelPolled {
                purpose: ModelPollPurpose::Routine,
                result,
                ..
            } => match result {
                Ok(status) => {
                    let decision = self
                        .barrier
                        .as_mut()
                        .map_or(BarrierDecision::Continue, |b| b.apply_model(&status));
                    self.on_barrier_decision(decision, epoch).await;
                    self.send_readiness_progress().await;
                }
                Err(e) => log_poll_error("Model poll", &e),
            },

            Signal::ModelPolled {
                purpose: ModelPollPurpose::DoubleCheck,
                result,
                ..
            } => match result {
                Ok(status) => {
                    let decision = self
                        .barrier
                        .as_mut()
                        .map_or(BarrierDecision::Continue, |b| b.apply_confirmation(&status));
                    if decision == BarrierDecision::Continue {
                        tracing::info!("Model re-check disagreed, resuming readiness polling");
                    }
                    self.on_barrier_decision(decision, epoch).await;
                }
                Err(e) => {
                    log_poll_error("Model re-check", &e);
                    if let Some(barrier) = self.barrier.as_mut() {
                        barrier.confirmation_failed();
                    }
                }
            },

            Signal::SensorPolled { result, .. } => match result {
                Ok(status) => {
                    let decision = self
                        .barrier
                        .as_mut()
                        .map_or(BarrierDecision::Continue, |b| b.apply_sensor(&status));
                    self.on_barrier_decision(decision, epoch).await;
                }
                Err(e) => log_poll_error("Sensor status poll", &e),
            },

            Signal::JobPolled { result, .. } => {
                let outcome = match result {
                    Ok(report) => {
                        tracing::debug!(status = ?report.status, "Job status polled");
                        self.generation.apply_report(report)
                    }
                    Err(e) => {
                        log_poll_error("Job status poll", &e);
                        self.generation.apply_poll_error(&e)
                    }
                };
                if let Some(outcome) = outcome {
                    self.finish_generation(outcome).await;
                }
            }

            Signal::TelemetryPolled { result, .. } => {
                let reading = match result {
                    Ok(reading) => Some(reading),
                    Err(e) => {
                        log_poll_error("Telemetry read", &e);
                        None
                    }
                };
                let sample = self.telemetry.record_sample(reading.as_ref());
                self.send(SessionMessage::TelemetrySampled { sample }).await;
            }
        }

        self.flush_pending().await;
    }

    async fn on_tick(&mut self, kind: TimerKind, epoch: u64) {
        tracing::trace!(kind = %kind, epoch, "Timer tick");

        match kind {
            TimerKind::ReadinessPoll => {
                let backend = Arc::clone(&self.backend);
                self.dispatch(async move {
                    Signal::HrvPolled {
                        epoch,
                        result: backend.latest_hrv().await,
                    }
                });
                let backend = Arc::clone(&self.backend);
                self.dispatch(async move {
                    Signal::ModelPolled {
                        epoch,
                        purpose: ModelPollPurpose::Routine,
                        result: backend.model_status().await,
                    }
                });
                let backend = Arc::clone(&self.backend);
                self.dispatch(async move {
                    Signal::SensorPolled {
                        epoch,
                        result: backend.sensor_status().await,
                    }
                });
            }

            TimerKind::JobPoll => {
                let Some(handle) = self.generation.job().map(|job| job.handle.clone()) else {
                    return;
                };
                if !self.generation.is_active() {
                    return;
                }
                let backend = Arc::clone(&self.backend);
                self.dispatch(async move {
                    Signal::JobPolled {
                        epoch,
                        result: backend.job_status(&handle).await,
                    }
                });
            }

            TimerKind::GenerationProgress => {
                let elapsed_secs = self
                    .generation_started
                    .map_or(0, |started| started.elapsed().as_secs());
                self.send(SessionMessage::GenerationProgress {
                    elapsed_secs,
                    status_text: generation_status_text(elapsed_secs),
                })
                .await;
            }

            TimerKind::TelemetrySample => {
                let backend = Arc::clone(&self.backend);
                self.dispatch(async move {
                    Signal::TelemetryPolled {
                        epoch,
                        result: backend.latest_hrv().await,
                    }
                });
            }
        }
    }

    async fn on_barrier_decision(&mut self, decision: BarrierDecision, epoch: u64) {
        match decision {
            BarrierDecision::Continue => {}

            BarrierDecision::Confirm => {
                tracing::info!("Readiness conditions hold, re-checking model");
                let backend = Arc::clone(&self.backend);
                self.dispatch(async move {
                    Signal::ModelPolled {
                        epoch,
                        purpose: ModelPollPurpose::DoubleCheck,
                        result: backend.model_status().await,
                    }
                });
            }

            BarrierDecision::Fire => {
                let reading = self.barrier.as_ref().and_then(|b| b.ready_reading().cloned());
                if let Some(reading) = reading {
                    self.telemetry.record_baseline(reading.hrv, reading.bpm);
                }
                tracing::info!(baseline = ?self.telemetry.baseline(), "Readiness barrier open");
                self.request_transition(SessionPhase::PreferenceSelection);
            }

            BarrierDecision::Abort { reason } => {
                tracing::error!(reason = %reason, "Sensor capture failed");
                self.notify(NotifyLevel::Error, reason).await;
                self.request_transition(SessionPhase::Initial);
            }
        }
    }

    /// Run a backend request off the loop and deliver its signal
    fn dispatch<F>(&self, request: F)
    where
        F: Future<Output = Signal> + Send + 'static,
    {
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            let signal = request.await;
            if tx.send(signal).await.is_err() {
                tracing::trace!("Orchestrator gone, response dropped");
            }
        });
    }

    // ============================================
    // Outbound Messages
    // ============================================

    async fn send_readiness_progress(&self) {
        let Some(barrier) = self.barrier.as_ref() else {
            return;
        };
        let state = barrier.state();
        self.send(SessionMessage::ReadinessProgress {
            hrv_ready: state.hrv_ready,
            model_ready: state.model_ready,
            model_confirm_count: state.model_confirm_count,
            model_message: barrier.model_message().map(str::to_string),
        })
        .await;
    }

    async fn notify(&self, level: NotifyLevel, message: impl Into<String>) {
        self.send(SessionMessage::Notify {
            level,
            message: message.into(),
        })
        .await;
    }

    async fn send(&self, msg: SessionMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

/// Transport hiccups are routine while polling; refusals are worth a warning
fn log_poll_error(what: &str, error: &BackendError) {
    if error.is_transient() {
        tracing::debug!(error = %error, "{what} failed, skipping");
    } else {
        tracing::warn!(error = %error, "{what} refused by backend, skipping");
    }
}
