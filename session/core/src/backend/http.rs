//! HTTP Backend Implementation
//!
//! Session backend over the sensor/model service's JSON API.
//!
//! # Endpoints
//!
//! - `POST /api/start-measurement` - start the HRV capture subprocess
//! - `GET  /api/measurement-status` - capture subprocess status
//! - `GET  /api/latest-hrv` - latest reading and its mtime
//! - `GET  /api/model-status` - model load status
//! - `POST /api/confirm-preference` - persist the music preference
//! - `POST /api/generate-music` - submit generation
//! - `GET  /api/generation-status/{job_id}` - poll an enqueued job
//! - `GET  /api/audio/{result_id}` - generated track
//! - `POST /api/simulate-hrv` - publish a simulated reading

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::{
    HrvReading, JobHandle, JobStatus, JobStatusReport, MeasurementParams, MeasurementStart,
    ModelStatus, PreferenceAck, SensorStatus, SessionBackend, SubmitOutcome,
};
use crate::config::SessionConfig;
use crate::error::BackendError;
use crate::preference::MusicPreference;

/// Longest response body kept in a [`BackendError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// HTTP backend client
#[derive(Clone)]
pub struct HttpBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Create from session configuration
    pub fn from_config(config: &SessionConfig) -> Result<Self, BackendError> {
        Self::new(config.backend.base_url.clone(), config.backend.request_timeout())
    }

    /// Base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.http_client.get(self.url(path)).send().await?;
        decode(response).await
    }

    /// POST and decode the body regardless of status. Used where the backend
    /// reports refusals as JSON alongside a 4xx/5xx code.
    async fn post_lenient<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(u16, T), BackendError> {
        let response = self.http_client.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<T>(&text) {
            Ok(value) => Ok((status.as_u16(), value)),
            Err(_) if !status.is_success() => Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate(text),
            }),
            Err(e) => Err(BackendError::Decode(e.to_string())),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: truncate(body),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// `POST /api/start-measurement` reply
#[derive(Debug, Default, Deserialize)]
struct MeasurementReply {
    #[serde(default)]
    started: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl MeasurementReply {
    fn into_start(self, status: u16) -> Result<MeasurementStart, BackendError> {
        if status == 409 || self.reason.as_deref() == Some("measurement_running") {
            return Ok(MeasurementStart::AlreadyRunning);
        }
        if self.started.unwrap_or(false) {
            return Ok(MeasurementStart::Started);
        }
        Err(BackendError::Rejected {
            error_type: self.reason,
            reason: self
                .error
                .unwrap_or_else(|| "sensor measurement did not start".to_string()),
        })
    }
}

/// `POST /api/generate-music` reply, in either backend shape
#[derive(Debug, Default, Deserialize)]
struct SubmitReply {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default, alias = "file_id", alias = "resultId")]
    result_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
}

impl SubmitReply {
    fn into_outcome(self) -> Result<SubmitOutcome, BackendError> {
        if self.success == Some(true) {
            if let Some(result_id) = self.result_id {
                return Ok(SubmitOutcome::Immediate(result_id));
            }
        }
        let status = self.status.as_deref().and_then(JobStatus::parse);
        if matches!(status, Some(JobStatus::Processing | JobStatus::Queued)) {
            return Ok(SubmitOutcome::Enqueued(JobHandle(self.job_id)));
        }
        Err(BackendError::Rejected {
            error_type: self.error_type,
            reason: self.error.unwrap_or_default(),
        })
    }
}

/// `GET /api/generation-status` reply
#[derive(Debug, Default, Deserialize)]
struct JobReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "file_id", alias = "resultId")]
    result_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl JobReply {
    fn into_report(self) -> Result<JobStatusReport, BackendError> {
        let raw = self.status.unwrap_or_default();
        let status = JobStatus::parse(&raw)
            .ok_or_else(|| BackendError::Decode(format!("unknown job status '{raw}'")))?;
        Ok(JobStatusReport {
            status,
            result_id: self.result_id,
            error: self.error,
        })
    }
}

/// Generic `{ success, error }` reply
#[derive(Debug, Default, Deserialize)]
struct AckReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl SessionBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn start_measurement(
        &self,
        params: &MeasurementParams,
    ) -> Result<MeasurementStart, BackendError> {
        let (status, reply): (u16, MeasurementReply) =
            self.post_lenient("/api/start-measurement", params).await?;
        reply.into_start(status)
    }

    async fn sensor_status(&self) -> Result<SensorStatus, BackendError> {
        self.get_json("/api/measurement-status").await
    }

    async fn latest_hrv(&self) -> Result<HrvReading, BackendError> {
        self.get_json("/api/latest-hrv").await
    }

    async fn model_status(&self) -> Result<ModelStatus, BackendError> {
        self.get_json("/api/model-status").await
    }

    async fn confirm_preference(
        &self,
        preference: MusicPreference,
    ) -> Result<PreferenceAck, BackendError> {
        let body = serde_json::json!({ "preference": preference.as_str() });
        let (_, ack) = self.post_lenient("/api/confirm-preference", &body).await?;
        Ok(ack)
    }

    async fn submit_generation(
        &self,
        preference: MusicPreference,
    ) -> Result<SubmitOutcome, BackendError> {
        let body = serde_json::json!({ "preference": preference.as_str() });
        let (_, reply): (u16, SubmitReply) =
            self.post_lenient("/api/generate-music", &body).await?;
        reply.into_outcome()
    }

    async fn job_status(&self, job: &JobHandle) -> Result<JobStatusReport, BackendError> {
        let path = match job.id() {
            Some(id) => format!("/api/generation-status/{id}"),
            None => "/api/generation-status".to_string(),
        };
        let reply: JobReply = self.get_json(&path).await?;
        reply.into_report()
    }

    async fn fetch_audio(&self, result_id: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http_client
            .get(self.audio_url(result_id))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn inject_reading(&self, hrv: f64, bpm: Option<f64>) -> Result<(), BackendError> {
        let body = serde_json::json!({ "hrv": hrv, "bpm": bpm });
        let (_, ack): (u16, AckReply) = self.post_lenient("/api/simulate-hrv", &body).await?;
        if ack.success {
            Ok(())
        } else {
            Err(BackendError::rejected(
                ack.error.unwrap_or_else(|| "simulated reading rejected".to_string()),
            ))
        }
    }

    fn audio_url(&self, result_id: &str) -> String {
        self.url(&format!("/api/audio/{result_id}"))
    }
}
