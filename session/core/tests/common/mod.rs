//! Shared fixtures for orchestrator integration tests
//!
//! [`ScriptedBackend`] answers each backend operation from a queue of
//! scripted replies. The last reply in a queue repeats forever, so a script
//! only spells out the interesting prefix.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use hrv_session_core::{
    BackendError, ConfigError, HrvReading, JobHandle, JobStatusReport, MeasurementParams,
    MeasurementStart, ModelStatus, MusicPreference, Orchestrator, PreferenceAck, SensorStatus,
    SessionBackend, SessionConfig, SessionMessage, SessionPhase, SubmitOutcome,
};

/// A scripted reply; `Err` becomes a transient backend error
pub type Reply<T> = Result<T, String>;

/// How many times each operation was called
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Calls {
    pub start: usize,
    pub sensor: usize,
    pub hrv: usize,
    pub model: usize,
    pub confirm: usize,
    pub submit: usize,
    pub job: usize,
    pub fetch: usize,
    pub inject: usize,
}

struct Script {
    start: Reply<MeasurementStart>,
    sensor: VecDeque<Reply<SensorStatus>>,
    hrv: VecDeque<Reply<HrvReading>>,
    model: VecDeque<Reply<ModelStatus>>,
    ack: Reply<PreferenceAck>,
    submit: VecDeque<Reply<SubmitOutcome>>,
    jobs: VecDeque<Reply<JobStatusReport>>,
    inject: Reply<()>,
    injected: Vec<(f64, Option<f64>)>,
    calls: Calls,
}

fn next<T: Clone>(queue: &mut VecDeque<Reply<T>>, default: Reply<T>) -> Result<T, BackendError> {
    let reply = if queue.len() > 1 {
        queue.pop_front().unwrap_or(default)
    } else {
        queue.front().cloned().unwrap_or(default)
    };
    reply.map_err(BackendError::Decode)
}

/// In-memory backend driven by scripted replies
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    /// Backend where no reading exists at baseline, a fresh reading appears on
    /// the first tick, the model is loaded and generation is synchronous
    pub fn ready() -> Self {
        Self {
            script: Mutex::new(Script {
                start: Ok(MeasurementStart::Started),
                sensor: VecDeque::from([Ok(running())]),
                hrv: VecDeque::from([Ok(HrvReading::absent()), Ok(reading(10.0, 45.0, 70.0))]),
                model: VecDeque::from([Ok(ModelStatus::loaded(true))]),
                ack: Ok(PreferenceAck {
                    success: true,
                    preference: None,
                    error: None,
                }),
                submit: VecDeque::from([Ok(SubmitOutcome::Immediate("track-1".into()))]),
                jobs: VecDeque::from([Ok(JobStatusReport::processing())]),
                inject: Ok(()),
                injected: Vec::new(),
                calls: Calls::default(),
            }),
        }
    }

    pub fn with_start(self, reply: Reply<MeasurementStart>) -> Self {
        self.script.lock().start = reply;
        self
    }

    pub fn with_sensor(self, replies: Vec<Reply<SensorStatus>>) -> Self {
        self.script.lock().sensor = replies.into();
        self
    }

    /// HRV replies; the first one answers the baseline read
    pub fn with_hrv(self, replies: Vec<Reply<HrvReading>>) -> Self {
        self.script.lock().hrv = replies.into();
        self
    }

    /// Model replies, routine polls and re-checks alike, in call order
    pub fn with_model(self, replies: Vec<Reply<ModelStatus>>) -> Self {
        self.script.lock().model = replies.into();
        self
    }

    pub fn with_ack(self, reply: Reply<PreferenceAck>) -> Self {
        self.script.lock().ack = reply;
        self
    }

    pub fn with_submit(self, replies: Vec<Reply<SubmitOutcome>>) -> Self {
        self.script.lock().submit = replies.into();
        self
    }

    pub fn with_jobs(self, replies: Vec<Reply<JobStatusReport>>) -> Self {
        self.script.lock().jobs = replies.into();
        self
    }

    /// Injection reply; an `Err` is a refusal by the backend
    pub fn with_inject(self, reply: Reply<()>) -> Self {
        self.script.lock().inject = reply;
        self
    }

    /// Replace the HRV replies mid-session
    pub fn set_hrv(&self, replies: Vec<Reply<HrvReading>>) {
        self.script.lock().hrv = replies.into();
    }

    pub fn calls(&self) -> Calls {
        self.script.lock().calls
    }

    pub fn injected(&self) -> Vec<(f64, Option<f64>)> {
        self.script.lock().injected.clone()
    }
}

#[async_trait]
impl SessionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start_measurement(
        &self,
        _params: &MeasurementParams,
    ) -> Result<MeasurementStart, BackendError> {
        let mut s = self.script.lock();
        s.calls.start += 1;
        s.start.clone().map_err(BackendError::rejected)
    }

    async fn sensor_status(&self) -> Result<SensorStatus, BackendError> {
        let mut s = self.script.lock();
        s.calls.sensor += 1;
        next(&mut s.sensor, Ok(running()))
    }

    async fn latest_hrv(&self) -> Result<HrvReading, BackendError> {
        let mut s = self.script.lock();
        s.calls.hrv += 1;
        next(&mut s.hrv, Ok(HrvReading::absent()))
    }

    async fn model_status(&self) -> Result<ModelStatus, BackendError> {
        let mut s = self.script.lock();
        s.calls.model += 1;
        next(&mut s.model, Ok(ModelStatus::loaded(false)))
    }

    async fn confirm_preference(
        &self,
        _preference: MusicPreference,
    ) -> Result<PreferenceAck, BackendError> {
        let mut s = self.script.lock();
        s.calls.confirm += 1;
        s.ack.clone().map_err(BackendError::Decode)
    }

    async fn submit_generation(
        &self,
        _preference: MusicPreference,
    ) -> Result<SubmitOutcome, BackendError> {
        let mut s = self.script.lock();
        s.calls.submit += 1;
        let reply = if s.submit.len() > 1 {
            s.submit.pop_front()
        } else {
            s.submit.front().cloned()
        };
        match reply {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(reason)) => Err(BackendError::Rejected {
                error_type: Some("generation_error".into()),
                reason,
            }),
            None => Err(BackendError::rejected("no submit scripted")),
        }
    }

    async fn job_status(&self, _job: &JobHandle) -> Result<JobStatusReport, BackendError> {
        let mut s = self.script.lock();
        s.calls.job += 1;
        next(&mut s.jobs, Ok(JobStatusReport::processing()))
    }

    async fn fetch_audio(&self, _result_id: &str) -> Result<Vec<u8>, BackendError> {
        self.script.lock().calls.fetch += 1;
        Ok(b"RIFF".to_vec())
    }

    async fn inject_reading(&self, hrv: f64, bpm: Option<f64>) -> Result<(), BackendError> {
        let mut s = self.script.lock();
        s.calls.inject += 1;
        s.inject.clone().map_err(BackendError::rejected)?;
        s.injected.push((hrv, bpm));
        Ok(())
    }

    fn audio_url(&self, result_id: &str) -> String {
        format!("http://backend.test/api/audio/{result_id}")
    }
}

pub fn running() -> SensorStatus {
    SensorStatus {
        running: true,
        ..Default::default()
    }
}

pub fn crashed(error: &str) -> SensorStatus {
    SensorStatus {
        running: false,
        finished: true,
        error: Some(error.to_string()),
        output: None,
    }
}

pub fn reading(mtime: f64, hrv: f64, bpm: f64) -> HrvReading {
    HrvReading::new(mtime, hrv, Some(bpm))
}

pub fn loaded(flag: bool) -> Reply<ModelStatus> {
    Ok(ModelStatus::loaded(flag))
}

/// Orchestrator over `backend` with a message channel deep enough that tests
/// never block on it
pub fn orchestrator(
    backend: ScriptedBackend,
) -> (Orchestrator<ScriptedBackend>, mpsc::Receiver<SessionMessage>) {
    let (orch, rx) = orchestrator_with(backend, SessionConfig::default())
        .expect("default config is valid");
    (orch, rx)
}

/// Orchestrator over `backend` with `config`
pub fn orchestrator_with(
    backend: ScriptedBackend,
    config: SessionConfig,
) -> Result<(Orchestrator<ScriptedBackend>, mpsc::Receiver<SessionMessage>), ConfigError> {
    let (tx, rx) = mpsc::channel(4096);
    Ok((Orchestrator::new(backend, config, tx)?, rx))
}

/// Step the orchestrator until `done` holds or `max_steps` signals were
/// processed. Returns whether `done` held.
pub async fn drive_until<F>(
    orch: &mut Orchestrator<ScriptedBackend>,
    max_steps: usize,
    mut done: F,
) -> bool
where
    F: FnMut(&Orchestrator<ScriptedBackend>) -> bool,
{
    for _ in 0..max_steps {
        if done(orch) {
            return true;
        }
        match tokio::time::timeout(Duration::from_secs(300), orch.step()).await {
            Ok(true) => {}
            _ => break,
        }
    }
    done(orch)
}

/// Process every signal that arrives within `window` of virtual time
pub async fn drive_for(orch: &mut Orchestrator<ScriptedBackend>, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(true) = tokio::time::timeout_at(deadline, orch.step()).await {}
}

/// Everything the orchestrator has sent so far
pub fn drain(rx: &mut mpsc::Receiver<SessionMessage>) -> Vec<SessionMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Phases entered, in order
pub fn phases(messages: &[SessionMessage]) -> Vec<SessionPhase> {
    messages
        .iter()
        .filter_map(|m| match m {
            SessionMessage::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

/// Start a session and drive it to preference selection
pub async fn reach_preference_selection(orch: &mut Orchestrator<ScriptedBackend>) {
    orch.handle_event(hrv_session_core::SessionEvent::StartRequested)
        .await;
    let reached = drive_until(orch, 200, |o| {
        o.phase() == SessionPhase::PreferenceSelection
    })
    .await;
    assert!(reached, "barrier never opened");
}
