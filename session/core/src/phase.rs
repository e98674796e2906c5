//! Session Phases
//!
//! The five pages a session moves through and the edges between them.
//!
//! ```text
//! Initial ──start──▶ Detecting ──barrier──▶ PreferenceSelection ──confirm──▶ Loading
//!    ▲                   │                          ▲                           │
//!    │            sensor failure                job failure                 job done
//!    │                   ▼                          │                           ▼
//!    └───────────────────┴───────────────restart────┴──────────────────── Playing
//! ```

use serde::{Deserialize, Serialize};

/// A session phase. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Landing page, nothing running
    #[default]
    Initial,
    /// Sensor capture and model load in progress
    Detecting,
    /// Waiting for the user to pick a music preference
    PreferenceSelection,
    /// Generation job in flight
    Loading,
    /// Track playing, telemetry sampling
    Playing,
}

impl SessionPhase {
    /// All phases, in session order
    pub const ALL: [SessionPhase; 5] = [
        Self::Initial,
        Self::Detecting,
        Self::PreferenceSelection,
        Self::Loading,
        Self::Playing,
    ];

    /// Parse a phase name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "initial" | "start" => Some(Self::Initial),
            "detecting" | "detection" => Some(Self::Detecting),
            "preference_selection" | "preference" | "preferenceselection" => {
                Some(Self::PreferenceSelection)
            }
            "loading" => Some(Self::Loading),
            "playing" | "playback" => Some(Self::Playing),
            _ => None,
        }
    }

    /// Whether `self → target` is a legal edge
    #[must_use]
    pub fn can_transition_to(self, target: SessionPhase) -> bool {
        matches!(
            (self, target),
            (Self::Initial, Self::Detecting)
                | (Self::Detecting, Self::PreferenceSelection | Self::Initial)
                | (Self::PreferenceSelection, Self::Loading)
                | (Self::Loading, Self::Playing | Self::PreferenceSelection)
                | (Self::Playing, Self::Initial)
        )
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::Detecting => "Detecting",
            Self::PreferenceSelection => "Preference Selection",
            Self::Loading => "Loading",
            Self::Playing => "Playing",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_initial() {
        assert_eq!(SessionPhase::default(), SessionPhase::Initial);
    }

    #[test]
    fn test_happy_path_edges() {
        use SessionPhase::*;
        assert!(Initial.can_transition_to(Detecting));
        assert!(Detecting.can_transition_to(PreferenceSelection));
        assert!(PreferenceSelection.can_transition_to(Loading));
        assert!(Loading.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Initial));
    }

    #[test]
    fn test_recovery_edges() {
        use SessionPhase::*;
        assert!(Detecting.can_transition_to(Initial));
        assert!(Loading.can_transition_to(PreferenceSelection));
    }

    #[test]
    fn test_everything_else_is_rejected() {
        let legal = [
            (SessionPhase::Initial, SessionPhase::Detecting),
            (SessionPhase::Detecting, SessionPhase::PreferenceSelection),
            (SessionPhase::Detecting, SessionPhase::Initial),
            (SessionPhase::PreferenceSelection, SessionPhase::Loading),
            (SessionPhase::Loading, SessionPhase::Playing),
            (SessionPhase::Loading, SessionPhase::PreferenceSelection),
            (SessionPhase::Playing, SessionPhase::Initial),
        ];
        for from in SessionPhase::ALL {
            for to in SessionPhase::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(SessionPhase::parse("Playing"), Some(SessionPhase::Playing));
        assert_eq!(
            SessionPhase::parse("preference-selection"),
            Some(SessionPhase::PreferenceSelection)
        );
        assert_eq!(SessionPhase::parse("page7"), None);
    }
}
