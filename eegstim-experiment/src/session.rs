use std::time::Duration;

use eegstim_core::{Condition, Trial};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::error::SessionError;
use crate::sequence::{attach_payloads, generate_conditions};

/// The generated trial list of one run plus a forward-only cursor.
///
/// The random stream that built the list keeps going: inter-trial intervals are drawn from
/// it during the run, so a seed reproduces the whole session.
#[derive(Debug, Serialize)]
pub struct Session {
    seed: u64,
    active_count: usize,
    rest_count: usize,
    trials: Vec<Trial>,
    #[serde(skip)]
    cursor: usize,
    #[serde(skip)]
    rng: StdRng,
}

impl Session {
    /// Validates `config`, then draws the order followed by the payloads.
    pub fn generate(config: &ExperimentConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let order = generate_conditions(
            config.trials_per_state,
            config.max_run,
            config.max_attempts,
            &mut rng,
        )?;
        let trials = attach_payloads(
            &order,
            config.start_range,
            config.decrement_range,
            &mut rng,
        );
        let active_count = trials.iter().filter(|t| t.condition().is_active()).count();
        let rest_count = trials.len() - active_count;
        info!(seed, trials = trials.len(), "session generated");

        Ok(Self {
            seed,
            active_count,
            rest_count,
            trials,
            cursor: 0,
            rng,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn count(&self, condition: Condition) -> usize {
        match condition {
            Condition::Active => self.active_count,
            Condition::Rest => self.rest_count,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Trial> {
        self.trials.get(self.cursor)
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.trials.len()
    }

    /// Moves to the next trial. Returns `false` once the list is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Fresh inter-trial interval, uniform over the inclusive range.
    pub fn draw_iti(&mut self, range_ms: (u64, u64)) -> Duration {
        Duration::from_millis(self.rng.random_range(range_ms.0..=range_ms.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn seeded(trials_per_state: usize, seed: u64) -> ExperimentConfig {
        ExperimentConfig {
            trials_per_state,
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_session_reproducible_end_to_end() {
        let config = seeded(6, 99);
        let mut a = Session::generate(&config).unwrap();
        let mut b = Session::generate(&config).unwrap();
        assert_eq!(a.trials(), b.trials());
        for _ in 0..5 {
            assert_eq!(a.draw_iti((1000, 2000)), b.draw_iti((1000, 2000)));
        }
    }

    #[test]
    fn test_counts_match_config() {
        let session = Session::generate(&seeded(3, 5)).unwrap();
        assert_eq!(session.len(), 6);
        assert_eq!(session.count(Condition::Active), 3);
        assert_eq!(session.count(Condition::Rest), 3);
        assert_eq!(session.seed(), 5);
    }

    #[test]
    fn test_cursor_only_moves_forward() {
        let mut session = Session::generate(&seeded(1, 1)).unwrap();
        assert_eq!(session.cursor(), 0);
        assert!(!session.is_last());
        assert!(session.advance());
        assert!(session.is_last());
        assert!(!session.advance());
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_iti_within_range() {
        let mut session = Session::generate(&seeded(1, 8)).unwrap();
        for _ in 0..100 {
            let iti = session.draw_iti((500, 750));
            assert!(iti >= Duration::from_millis(500) && iti <= Duration::from_millis(750));
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_generation() {
        let err = Session::generate(&seeded(0, 1)).unwrap_err();
        assert!(matches!(err, SessionError::Config(ConfigError::NoTrials)));
    }

    #[test]
    fn test_infeasible_run_length_is_sequence_error() {
        let config = ExperimentConfig {
            max_run: 0,
            max_attempts: 50,
            ..seeded(10, 2)
        };
        assert!(matches!(
            Session::generate(&config),
            Err(SessionError::Sequence(_))
        ));
    }

    #[test]
    fn test_serializes_plan() {
        let session = Session::generate(&seeded(1, 4)).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["seed"], 4);
        assert_eq!(json["trials"].as_array().map(Vec::len), Some(2));
        assert!(json.get("cursor").is_none());
    }
}
