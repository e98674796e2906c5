//! Session Telemetry
//!
//! Before/after physiological tracking for one session: a baseline taken
//! when detection completes, periodic samples while the track plays, and a
//! summary computed when playback ends.
//!
//! # Design Philosophy
//!
//! The sample sequence is kept dense for charting. When the reading is
//! momentarily missing the tracker records a placeholder carrying the last
//! measured values, flagged so nothing downstream mistakes it for a real
//! reading. The backend often reports HRV without a heart rate; such a
//! sample is real, only its `bpm` is marked as estimated. A summary can always be rendered, even for a session that
//! produced no samples at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::HrvReading;
use crate::config::TelemetrySettings;

/// One telemetry sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
    /// HRV in milliseconds
    pub hrv_ms: f64,
    /// Heart rate in beats per minute
    pub bpm: f64,
    /// HRV synthesized because no reading was available
    pub placeholder: bool,
    /// Heart rate carried over because the reading had none
    #[serde(default)]
    pub bpm_estimated: bool,
}

/// Before/after comparison shown at the end of a session
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Baseline HRV
    pub start_hrv: f64,
    /// HRV at the end of playback
    pub end_hrv: f64,
    /// Baseline heart rate
    pub start_bpm: f64,
    /// Heart rate at the end of playback
    pub end_bpm: f64,
}

impl SessionSummary {
    /// Change in HRV over the session
    #[must_use]
    pub fn hrv_delta(&self) -> f64 {
        self.end_hrv - self.start_hrv
    }

    /// Change in heart rate over the session
    #[must_use]
    pub fn bpm_delta(&self) -> f64 {
        self.end_bpm - self.start_bpm
    }
}

/// Records baseline and samples for one session
#[derive(Debug)]
pub struct TelemetryTracker {
    settings: TelemetrySettings,
    samples: Vec<TelemetrySample>,
    baseline_hrv: Option<f64>,
    baseline_bpm: Option<f64>,
    summary: Option<SessionSummary>,
}

impl TelemetryTracker {
    /// Empty tracker
    #[must_use]
    pub fn new(settings: TelemetrySettings) -> Self {
        Self {
            settings,
            samples: Vec::new(),
            baseline_hrv: None,
            baseline_bpm: None,
            summary: None,
        }
    }

    /// Clear samples, baseline and the cached summary
    pub fn reset(&mut self) {
        self.samples.clear();
        self.baseline_hrv = None;
        self.baseline_bpm = None;
        self.summary = None;
    }

    /// Set the baseline; fields already set are kept
    pub fn record_baseline(&mut self, hrv: Option<f64>, bpm: Option<f64>) {
        if self.baseline_hrv.is_none() {
            self.baseline_hrv = hrv;
        }
        if self.baseline_bpm.is_none() {
            self.baseline_bpm = bpm;
        }
    }

    /// Baseline `(hrv, bpm)` as recorded
    #[must_use]
    pub fn baseline(&self) -> (Option<f64>, Option<f64>) {
        (self.baseline_hrv, self.baseline_bpm)
    }

    /// Samples recorded so far, oldest first
    #[must_use]
    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    /// Append a sample from the latest reading, or a placeholder without one
    pub fn record_sample(&mut self, reading: Option<&HrvReading>) -> TelemetrySample {
        let (fallback_hrv, fallback_bpm) = self.fallback_values();

        let sample = match reading.filter(|r| r.has_content()) {
            Some(r) => TelemetrySample {
                timestamp: Utc::now(),
                hrv_ms: r.hrv.unwrap_or(fallback_hrv),
                bpm: r.bpm.unwrap_or(fallback_bpm),
                placeholder: false,
                bpm_estimated: r.bpm.is_none(),
            },
            None => TelemetrySample {
                timestamp: Utc::now(),
                hrv_ms: fallback_hrv,
                bpm: fallback_bpm,
                placeholder: true,
                bpm_estimated: true,
            },
        };

        if sample.placeholder {
            tracing::debug!(hrv_ms = sample.hrv_ms, bpm = sample.bpm, "Placeholder telemetry sample");
        }
        self.samples.push(sample.clone());
        sample
    }

    /// Compute the summary once; later calls return the cached value
    pub fn compute_summary(&mut self) -> SessionSummary {
        if let Some(summary) = self.summary {
            return summary;
        }

        let start_hrv = self.baseline_hrv.unwrap_or(self.settings.fallback_hrv_ms);
        let start_bpm = self.baseline_bpm.unwrap_or(self.settings.fallback_bpm);

        let window = self.settings.summary_window.max(1);
        let tail = &self.samples[self.samples.len().saturating_sub(window)..];

        let (end_hrv, end_bpm) = if tail.is_empty() {
            (
                start_hrv + self.settings.hrv_fallback_delta,
                start_bpm - self.settings.bpm_fallback_delta,
            )
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = tail.len() as f64;
            (
                tail.iter().map(|s| s.hrv_ms).sum::<f64>() / n,
                tail.iter().map(|s| s.bpm).sum::<f64>() / n,
            )
        };

        let summary = SessionSummary {
            start_hrv: start_hrv.round(),
            end_hrv: end_hrv.round(),
            start_bpm: start_bpm.round(),
            end_bpm: end_bpm.round(),
        };
        tracing::info!(
            start_hrv = summary.start_hrv,
            end_hrv = summary.end_hrv,
            start_bpm = summary.start_bpm,
            end_bpm = summary.end_bpm,
            samples = self.samples.len(),
            "Session summary computed"
        );
        self.summary = Some(summary);
        summary
    }

    /// Cached summary, if computed
    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.summary
    }

    /// Last measured HRV and heart rate, tracked independently
    fn fallback_values(&self) -> (f64, f64) {
        let hrv = self
            .samples
            .iter()
            .rev()
            .find(|s| !s.placeholder)
            .map(|s| s.hrv_ms)
            .or(self.baseline_hrv)
            .unwrap_or(self.settings.fallback_hrv_ms);
        let bpm = self
            .samples
            .iter()
            .rev()
            .find(|s| !s.bpm_estimated)
            .map(|s| s.bpm)
            .or(self.baseline_bpm)
            .unwrap_or(self.settings.fallback_bpm);
        (hrv, bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracker() -> TelemetryTracker {
        TelemetryTracker::new(TelemetrySettings::default())
    }

    fn hrv_only(hrv: f64) -> HrvReading {
        HrvReading::new(1.0, hrv, None)
    }

    #[test]
    fn test_summary_averages_last_three() {
        let mut t = tracker();
        t.record_baseline(Some(40.0), None);
        for hrv in [40.0, 42.0, 50.0, 55.0] {
            t.record_sample(Some(&hrv_only(hrv)));
        }
        let summary = t.compute_summary();
        assert_eq!(summary.start_hrv, 40.0);
        assert_eq!(summary.end_hrv, 49.0);
    }

    #[test]
    fn test_summary_fallback_without_samples() {
        let mut t = tracker();
        t.record_baseline(Some(40.0), Some(75.0));
        let summary = t.compute_summary();
        assert_eq!(
            summary,
            SessionSummary {
                start_hrv: 40.0,
                end_hrv: 52.0,
                start_bpm: 75.0,
                end_bpm: 69.0,
            }
        );
        assert_eq!(summary.hrv_delta(), 12.0);
        assert_eq!(summary.bpm_delta(), -6.0);
    }

    #[test]
    fn test_baseline_first_writer_wins() {
        let mut t = tracker();
        t.record_baseline(Some(40.0), None);
        t.record_baseline(Some(60.0), Some(80.0));
        assert_eq!(t.baseline(), (Some(40.0), Some(80.0)));
    }

    #[test]
    fn test_placeholder_uses_last_real_sample() {
        let mut t = tracker();
        t.record_baseline(Some(40.0), Some(75.0));

        let first = t.record_sample(None);
        assert!(first.placeholder);
        assert_eq!((first.hrv_ms, first.bpm), (40.0, 75.0));

        let real = t.record_sample(Some(&HrvReading::new(2.0, 55.0, Some(68.0))));
        assert!(!real.placeholder);
        assert!(!real.bpm_estimated);

        let gap = t.record_sample(Some(&HrvReading::absent()));
        assert!(gap.placeholder);
        assert_eq!((gap.hrv_ms, gap.bpm), (55.0, 68.0));
    }

    #[test]
    fn test_hrv_without_bpm_is_a_real_sample() {
        let mut t = tracker();
        t.record_baseline(Some(40.0), Some(75.0));

        let real = t.record_sample(Some(&hrv_only(55.0)));
        assert!(!real.placeholder);
        assert!(real.bpm_estimated);
        assert_eq!((real.hrv_ms, real.bpm), (55.0, 75.0));

        let gap = t.record_sample(None);
        assert!(gap.placeholder);
        assert_eq!((gap.hrv_ms, gap.bpm), (55.0, 75.0));
    }

    #[test]
    fn test_bpm_fallback_tracks_last_measured_bpm() {
        let mut t = tracker();
        t.record_sample(Some(&HrvReading::new(1.0, 50.0, Some(66.0))));
        let sample = t.record_sample(Some(&hrv_only(52.0)));
        assert_eq!((sample.hrv_ms, sample.bpm), (52.0, 66.0));
        assert!(sample.bpm_estimated);
        assert!(!sample.placeholder);
    }

    #[test]
    fn test_placeholder_without_any_history() {
        let mut t = tracker();
        let sample = t.record_sample(None);
        assert_eq!((sample.hrv_ms, sample.bpm), (50.0, 72.0));
        assert!(sample.placeholder);
    }

    #[test]
    fn test_summary_cached_until_reset() {
        let mut t = tracker();
        t.record_baseline(Some(40.0), Some(75.0));
        let first = t.compute_summary();
        t.record_sample(Some(&HrvReading::new(2.0, 90.0, Some(60.0))));
        assert_eq!(t.compute_summary(), first);

        t.reset();
        assert!(t.summary().is_none());
        assert!(t.samples().is_empty());
        assert_eq!(t.baseline(), (None, None));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let mut t = tracker();
        for hrv in [40.0, 41.0] {
            t.record_sample(Some(&HrvReading::new(1.0, hrv, Some(70.0))));
        }
        assert_eq!(t.compute_summary().end_hrv, 41.0);
    }
}
