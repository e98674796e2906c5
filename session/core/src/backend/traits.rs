//! Session Backend Traits
//!
//! Trait and response types for the sensor/model backend. The orchestrator
//! only ever talks to a [`SessionBackend`], so tests can swap in a scripted
//! implementation and the HTTP client stays a thin wrapper.
//!
//! # Design Philosophy
//!
//! Response types are normalized here. Backend versions that answer the same
//! question with different shapes (synchronous result vs. enqueued job) are
//! folded into tagged variants like [`SubmitOutcome`] by the client, so the
//! orchestrator dispatches on a variant instead of probing fields.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::preference::MusicPreference;

/// Parameters for starting a sensor capture
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementParams {
    /// Serial device path
    pub port: String,
    /// Baud rate
    pub baud: u32,
    /// HRV window in seconds
    pub window: u32,
}

impl Default for MeasurementParams {
    fn default() -> Self {
        Self {
            port: "/dev/tty.usbmodem2017_2_251".to_string(),
            baud: 115_200,
            window: 30,
        }
    }
}

/// Result of asking the backend to start a capture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementStart {
    /// A new capture process was launched
    Started,
    /// A capture was already running; it keeps going
    AlreadyRunning,
}

/// Status of the sensor capture subprocess
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorStatus {
    /// Process is alive
    #[serde(default)]
    pub running: bool,
    /// Process has exited
    #[serde(default)]
    pub finished: bool,
    /// Error reported when the process exited
    #[serde(default)]
    pub error: Option<String>,
    /// Tail of the process output
    #[serde(default, alias = "output_tail")]
    pub output: Option<String>,
}

impl SensorStatus {
    /// Whether the capture terminated with an error
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.finished && self.error.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// The latest HRV reading as published by the sensor process
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HrvReading {
    /// Whether the reading file exists at all
    #[serde(default)]
    pub exists: bool,
    /// Last-modified marker (seconds since the epoch)
    #[serde(default)]
    pub mtime: Option<f64>,
    /// HRV in milliseconds, `None` if the file holds no number
    #[serde(default)]
    pub hrv: Option<f64>,
    /// Heart rate in beats per minute
    #[serde(default)]
    pub bpm: Option<f64>,
}

impl HrvReading {
    /// A present reading with content
    #[must_use]
    pub fn new(mtime: f64, hrv: f64, bpm: Option<f64>) -> Self {
        Self {
            exists: true,
            mtime: Some(mtime),
            hrv: Some(hrv),
            bpm,
        }
    }

    /// No reading published yet
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// The signal exists and carries a number
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.exists && self.hrv.is_some()
    }
}

/// Model load status
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    /// Model finished loading
    #[serde(default)]
    pub loaded: bool,
    /// Status message from the backend
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds spent loading so far
    #[serde(default)]
    pub elapsed_time: Option<f64>,
}

impl ModelStatus {
    /// Status with only the loaded flag set
    #[must_use]
    pub fn loaded(loaded: bool) -> Self {
        Self {
            loaded,
            ..Default::default()
        }
    }
}

/// Acknowledgment of a persisted preference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceAck {
    /// Preference was persisted
    #[serde(default)]
    pub success: bool,
    /// Normalized preference echoed back
    #[serde(default)]
    pub preference: Option<String>,
    /// Why persisting failed
    #[serde(default)]
    pub error: Option<String>,
}

/// Opaque handle for an enqueued generation job
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub Option<String>);

impl JobHandle {
    /// Handle for a job id
    pub fn new(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    /// Job id, if the backend issued one
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// What a generation submission produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Backend generated synchronously; the result is ready
    Immediate(String),
    /// Backend enqueued a job that must be polled
    Enqueued(JobHandle),
}

/// Status of a generation job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not started
    Queued,
    /// Generating
    Processing,
    /// Result available
    Completed,
    /// Generation failed
    Failed,
}

impl JobStatus {
    /// Parse a backend status string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "queued" | "pending" | "accepted" => Some(Self::Queued),
            "processing" | "running" | "generating" => Some(Self::Processing),
            "completed" | "complete" | "done" | "success" => Some(Self::Completed),
            "failed" | "error" => Some(Self::Failed),
            _ => None,
        }
    }

    /// No further transition happens after this status
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One job status poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobStatusReport {
    /// Reported status
    pub status: JobStatus,
    /// Result id once completed
    pub result_id: Option<String>,
    /// Error once failed
    pub error: Option<String>,
}

impl JobStatusReport {
    /// Still working
    #[must_use]
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            result_id: None,
            error: None,
        }
    }

    /// Finished with a result
    pub fn completed(result_id: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Completed,
            result_id: Some(result_id.into()),
            error: None,
        }
    }

    /// Finished with an error
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            result_id: None,
            error: Some(error.into()),
        }
    }
}

/// Session backend trait
///
/// One method per logical backend operation. Implementations must be cheap
/// to share: the orchestrator holds them in an `Arc` and calls them from
/// spawned fire-and-forget poll requests.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Start the HRV capture
    async fn start_measurement(
        &self,
        params: &MeasurementParams,
    ) -> Result<MeasurementStart, BackendError>;

    /// Status of the capture subprocess
    async fn sensor_status(&self) -> Result<SensorStatus, BackendError>;

    /// Latest published HRV reading
    async fn latest_hrv(&self) -> Result<HrvReading, BackendError>;

    /// Model load status
    async fn model_status(&self) -> Result<ModelStatus, BackendError>;

    /// Persist the listener's preference
    async fn confirm_preference(
        &self,
        preference: MusicPreference,
    ) -> Result<PreferenceAck, BackendError>;

    /// Submit a generation request
    async fn submit_generation(
        &self,
        preference: MusicPreference,
    ) -> Result<SubmitOutcome, BackendError>;

    /// Poll an enqueued job
    async fn job_status(&self, job: &JobHandle) -> Result<JobStatusReport, BackendError>;

    /// Download a generated track
    async fn fetch_audio(&self, result_id: &str) -> Result<Vec<u8>, BackendError>;

    /// Publish a simulated reading (demo/test path, bypasses hardware)
    async fn inject_reading(&self, hrv: f64, bpm: Option<f64>) -> Result<(), BackendError>;

    /// Where a surface can stream a generated track from
    fn audio_url(&self, result_id: &str) -> String;
}
