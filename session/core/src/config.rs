//! Session Configuration
//!
//! Configuration for the backend connection, poll cadences, telemetry
//! heuristics and sensor start parameters.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file,
//! `HRV_SESSION_*` environment variables. Surfaces apply their own flags on
//! top of the loaded value.
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:5001"
//!
//! [polling]
//! readiness_interval_ms = 1000
//! model_confirmations = 3
//!
//! [sensor]
//! port = "/dev/ttyACM0"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::MeasurementParams;
use crate::error::ConfigError;

/// Backend connection settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the backend service
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl BackendSettings {
    /// Per-request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Poll cadences
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Readiness barrier poll interval in milliseconds
    pub readiness_interval_ms: u64,
    /// Consecutive "loaded" polls required before the model counts as ready
    pub model_confirmations: u32,
    /// Generation job poll interval in milliseconds
    pub job_interval_ms: u64,
    /// Loading-phase progress tick in milliseconds
    pub progress_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            readiness_interval_ms: 1000,
            model_confirmations: 3,
            job_interval_ms: 2000,
            progress_interval_ms: 1000,
        }
    }
}

impl PollingSettings {
    /// Readiness barrier poll interval
    #[must_use]
    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    /// Generation job poll interval
    #[must_use]
    pub fn job_interval(&self) -> Duration {
        Duration::from_millis(self.job_interval_ms)
    }

    /// Loading-phase progress tick
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

/// Telemetry sampling and summary heuristics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Playback sampling interval in milliseconds
    pub sample_interval_ms: u64,
    /// Trailing samples averaged into the end-of-session values
    pub summary_window: usize,
    /// Placeholder HRV when nothing real is known
    pub fallback_hrv_ms: f64,
    /// Placeholder BPM when nothing real is known
    pub fallback_bpm: f64,
    /// Added to the start HRV when no samples were collected
    pub hrv_fallback_delta: f64,
    /// Subtracted from the start BPM when no samples were collected
    pub bpm_fallback_delta: f64,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 3000,
            summary_window: 3,
            fallback_hrv_ms: 50.0,
            fallback_bpm: 72.0,
            hrv_fallback_delta: 12.0,
            bpm_fallback_delta: 6.0,
        }
    }
}

impl TelemetrySettings {
    /// Playback sampling interval
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

/// Complete session configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Backend connection
    pub backend: BackendSettings,
    /// Poll cadences
    pub polling: PollingSettings,
    /// Telemetry heuristics
    pub telemetry: TelemetrySettings,
    /// Sensor start parameters
    pub sensor: MeasurementParams,
    /// Capacity of the orchestrator's channels
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            polling: PollingSettings::default(),
            telemetry: TelemetrySettings::default(),
            sensor: MeasurementParams::default(),
            channel_capacity: 100,
        }
    }
}

impl SessionConfig {
    /// Default configuration with `HRV_SESSION_*` environment overrides
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply `HRV_SESSION_*` environment overrides
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup
    ///
    /// Keys:
    /// - `HRV_SESSION_BACKEND_URL`
    /// - `HRV_SESSION_TIMEOUT_MS`
    /// - `HRV_SESSION_READINESS_INTERVAL_MS`
    /// - `HRV_SESSION_MODEL_CONFIRMATIONS`
    /// - `HRV_SESSION_JOB_INTERVAL_MS`
    /// - `HRV_SESSION_SAMPLE_INTERVAL_MS`
    /// - `HRV_SESSION_SENSOR_PORT`
    /// - `HRV_SESSION_SENSOR_BAUD`
    /// - `HRV_SESSION_SENSOR_WINDOW`
    ///
    /// Values that fail to parse are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        if let Some(url) = lookup("HRV_SESSION_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_TIMEOUT_MS") {
            self.backend.request_timeout_ms = v;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_READINESS_INTERVAL_MS") {
            self.polling.readiness_interval_ms = v;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_MODEL_CONFIRMATIONS") {
            self.polling.model_confirmations = v;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_JOB_INTERVAL_MS") {
            self.polling.job_interval_ms = v;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_SAMPLE_INTERVAL_MS") {
            self.telemetry.sample_interval_ms = v;
        }
        if let Some(port) = lookup("HRV_SESSION_SENSOR_PORT") {
            self.sensor.port = port;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_SENSOR_BAUD") {
            self.sensor.baud = v;
        }
        if let Some(v) = parsed(&lookup, "HRV_SESSION_SENSOR_WINDOW") {
            self.sensor.window = v;
        }
        self
    }

    /// Reject values the orchestrator cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.base_url is empty".into()));
        }
        let intervals = [
            ("backend.request_timeout_ms", self.backend.request_timeout_ms),
            ("polling.readiness_interval_ms", self.polling.readiness_interval_ms),
            ("polling.job_interval_ms", self.polling.job_interval_ms),
            ("polling.progress_interval_ms", self.polling.progress_interval_ms),
            ("telemetry.sample_interval_ms", self.telemetry.sample_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        if self.polling.model_confirmations == 0 {
            return Err(ConfigError::Invalid(
                "polling.model_confirmations must be at least 1".into(),
            ));
        }
        if self.telemetry.summary_window == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.summary_window must be at least 1".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config file location (`$XDG_CONFIG_HOME/hrv-session/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hrv-session").join("config.toml"))
}

/// Load and validate a config file
pub fn load_config_from_path(path: &Path) -> Result<SessionConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SessionConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`, or the default location if it exists,
/// then apply environment overrides
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig, ConfigError> {
    let base = match path {
        Some(path) => load_config_from_path(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = ?path, "Loading default config file");
                load_config_from_path(&path)?
            }
            None => SessionConfig::default(),
        },
    };
    let config = base.with_env();
    config.validate()?;
    Ok(config)
}
