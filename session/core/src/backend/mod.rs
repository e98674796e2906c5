//! Session Backend Integration
//!
//! Abstracted access to the sensor/model backend through a common trait.
//!
//! # Available Backends
//!
//! - **HTTP**: the backend service's JSON API (default)
//!
//! # Usage
//!
//! ```ignore
//! use hrv_session_core::backend::{HttpBackend, SessionBackend};
//!
//! let backend = HttpBackend::new("http://localhost:5001", Duration::from_secs(10))?;
//! let reading = backend.latest_hrv().await?;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{
    HrvReading, JobHandle, JobStatus, JobStatusReport, MeasurementParams, MeasurementStart,
    ModelStatus, PreferenceAck, SensorStatus, SessionBackend, SubmitOutcome,
};
