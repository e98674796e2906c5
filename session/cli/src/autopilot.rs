//! Autopilot
//!
//! Decides how the headless surface answers each orchestrator message. It
//! plays the listener's part: pick the preference as soon as selection
//! opens, listen once a track is ready, leave once the summary is in.

use hrv_session_core::{NotifyLevel, SessionEvent, SessionMessage, SessionPhase, SessionSummary};

/// Something the surface should do in response to a message
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Forward an event to the orchestrator
    Send(SessionEvent),
    /// Play (or download) the track, then report playback end
    Listen { result_id: String },
}

/// How the session ended
#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutcome {
    /// Playback finished and a summary was produced
    Completed(SessionSummary),
    /// The session could not complete
    Aborted(String),
}

pub struct Autopilot {
    preference: String,
    max_attempts: u32,
    attempts: u32,
    last_error: Option<String>,
    outcome: Option<SessionOutcome>,
}

impl Autopilot {
    pub fn new(preference: String, max_attempts: u32) -> Self {
        Self {
            preference,
            max_attempts: max_attempts.max(1),
            attempts: 0,
            last_error: None,
            outcome: None,
        }
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn react(&mut self, msg: &SessionMessage) -> Vec<Action> {
        match msg {
            SessionMessage::PhaseChanged {
                to: SessionPhase::PreferenceSelection,
                ..
            } => {
                if self.attempts >= self.max_attempts {
                    let reason = self
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "generation failed".to_string());
                    return self.abort(format!(
                        "{reason} (after {} attempt(s))",
                        self.attempts
                    ));
                }
                self.attempts += 1;
                vec![
                    Action::Send(SessionEvent::PreferenceSelected {
                        preference: self.preference.clone(),
                    }),
                    Action::Send(SessionEvent::PreferenceConfirmed),
                ]
            }

            SessionMessage::PhaseChanged {
                from: SessionPhase::Detecting,
                to: SessionPhase::Initial,
            } => {
                let reason = self
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "detection stopped".to_string());
                self.abort(reason)
            }

            SessionMessage::Notify {
                level: NotifyLevel::Error,
                message,
            } => {
                self.last_error = Some(message.clone());
                Vec::new()
            }

            // An unusable preference never reaches the backend; stop instead
            // of waiting in preference selection forever.
            SessionMessage::Notify {
                level: NotifyLevel::Warning,
                message,
            } if message.starts_with("Unsupported music preference")
                || message.starts_with("Please select") =>
            {
                self.abort(message.clone())
            }

            SessionMessage::PlaybackReady { result_id, .. } => vec![Action::Listen {
                result_id: result_id.clone(),
            }],

            SessionMessage::Summary { summary } => {
                self.outcome = Some(SessionOutcome::Completed(*summary));
                vec![Action::Send(SessionEvent::QuitRequested)]
            }

            _ => Vec::new(),
        }
    }

    fn abort(&mut self, reason: String) -> Vec<Action> {
        if self.outcome.is_none() {
            self.outcome = Some(SessionOutcome::Aborted(reason));
        }
        vec![Action::Send(SessionEvent::QuitRequested)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entered(from: SessionPhase, to: SessionPhase) -> SessionMessage {
        SessionMessage::PhaseChanged { from, to }
    }

    #[test]
    fn test_confirms_preference_when_selection_opens() {
        let mut pilot = Autopilot::new("rock".into(), 1);
        let actions = pilot.react(&entered(
            SessionPhase::Detecting,
            SessionPhase::PreferenceSelection,
        ));
        assert_eq!(
            actions,
            vec![
                Action::Send(SessionEvent::PreferenceSelected {
                    preference: "rock".into()
                }),
                Action::Send(SessionEvent::PreferenceConfirmed),
            ]
        );
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut pilot = Autopilot::new("pop".into(), 1);
        pilot.react(&entered(
            SessionPhase::Detecting,
            SessionPhase::PreferenceSelection,
        ));
        pilot.react(&SessionMessage::Notify {
            level: NotifyLevel::Error,
            message: "Audio generation failed, please retry".into(),
        });
        let actions = pilot.react(&entered(
            SessionPhase::Loading,
            SessionPhase::PreferenceSelection,
        ));

        assert_eq!(actions, vec![Action::Send(SessionEvent::QuitRequested)]);
        assert_eq!(
            pilot.outcome(),
            Some(&SessionOutcome::Aborted(
                "Audio generation failed, please retry (after 1 attempt(s))".into()
            ))
        );
    }

    #[test]
    fn test_detection_failure_aborts() {
        let mut pilot = Autopilot::new("pop".into(), 1);
        pilot.react(&SessionMessage::Notify {
            level: NotifyLevel::Error,
            message: "HRV measurement failed: port busy".into(),
        });
        pilot.react(&entered(SessionPhase::Detecting, SessionPhase::Initial));
        assert_eq!(
            pilot.outcome(),
            Some(&SessionOutcome::Aborted(
                "HRV measurement failed: port busy".into()
            ))
        );
    }

    #[test]
    fn test_summary_completes() {
        let mut pilot = Autopilot::new("pop".into(), 1);
        let summary = SessionSummary {
            start_hrv: 40.0,
            end_hrv: 52.0,
            start_bpm: 75.0,
            end_bpm: 69.0,
        };
        let actions = pilot.react(&SessionMessage::Summary { summary });
        assert_eq!(actions, vec![Action::Send(SessionEvent::QuitRequested)]);
        assert_eq!(pilot.outcome(), Some(&SessionOutcome::Completed(summary)));
    }

    #[test]
    fn test_listens_when_track_ready() {
        let mut pilot = Autopilot::new("pop".into(), 1);
        let actions = pilot.react(&SessionMessage::PlaybackReady {
            result_id: "abc".into(),
            audio_url: "http://localhost:5001/api/audio/abc".into(),
        });
        assert_eq!(
            actions,
            vec![Action::Listen {
                result_id: "abc".into()
            }]
        );
    }
}
