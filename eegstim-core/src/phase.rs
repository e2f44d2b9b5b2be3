use std::fmt;

/// States of one presentation run.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum PresentationState {
    #[default]
    Initializing,
    InitialFixation,
    /// Showing the trial at this cursor position.
    ActivePresentation { trial: usize },
    /// Fixation between `after` and the next trial.
    InterTrialInterval { after: usize },
    Complete,
    Aborted,
}

impl PresentationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }

    /// Whether the state machine may move from `self` to `next`.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        use PresentationState::{
            Aborted, ActivePresentation, Complete, InitialFixation, Initializing,
            InterTrialInterval,
        };
        match (self, next) {
            (s, Aborted) => !s.is_terminal(),
            (Initializing, InitialFixation) => true,
            (InitialFixation, ActivePresentation { trial: 0 }) => true,
            (ActivePresentation { trial }, InterTrialInterval { after }) => trial == after,
            (InterTrialInterval { after }, ActivePresentation { trial }) => *trial == after + 1,
            (ActivePresentation { .. }, Complete) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PresentationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => f.write_str("initializing"),
            Self::InitialFixation => f.write_str("initial-fixation"),
            Self::ActivePresentation { trial } => write!(f, "trial-{}", trial + 1),
            Self::InterTrialInterval { after } => write!(f, "iti-after-{}", after + 1),
            Self::Complete => f.write_str("complete"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path_is_allowed() {
        use PresentationState::*;
        let path = [
            Initializing,
            InitialFixation,
            ActivePresentation { trial: 0 },
            InterTrialInterval { after: 0 },
            ActivePresentation { trial: 1 },
            Complete,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        use PresentationState::*;
        assert!(!Initializing.can_transition_to(&ActivePresentation { trial: 0 }));
        assert!(!InterTrialInterval { after: 0 }.can_transition_to(&ActivePresentation { trial: 2 }));
        assert!(!InterTrialInterval { after: 3 }.can_transition_to(&Complete));
    }

    #[test]
    fn test_abort_only_from_live_states() {
        use PresentationState::*;
        assert!(Initializing.can_transition_to(&Aborted));
        assert!(InterTrialInterval { after: 4 }.can_transition_to(&Aborted));
        assert!(!Complete.can_transition_to(&Aborted));
        assert!(!Aborted.can_transition_to(&Aborted));
    }
}
