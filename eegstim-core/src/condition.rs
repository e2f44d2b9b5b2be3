use serde::{Deserialize, Serialize};

/// The two conditions a trial can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Task engagement (mental arithmetic).
    Active,
    /// Passive baseline.
    Rest,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::Active, Condition::Rest];

    /// Stable slot for per-condition counters.
    pub fn index(self) -> usize {
        match self {
            Condition::Active => 0,
            Condition::Rest => 1,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Condition::Active)
    }
}

/// Marker vocabulary for the two conditions, e.g. `focus` / `relaxation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionLabels {
    pub active: String,
    pub rest: String,
}

impl Default for ConditionLabels {
    fn default() -> Self {
        Self {
            active: "focus".to_string(),
            rest: "relaxation".to_string(),
        }
    }
}

impl ConditionLabels {
    pub fn new(active: impl Into<String>, rest: impl Into<String>) -> Self {
        Self {
            active: active.into(),
            rest: rest.into(),
        }
    }

    pub fn label(&self, condition: Condition) -> &str {
        match condition {
            Condition::Active => &self.active,
            Condition::Rest => &self.rest,
        }
    }

    pub fn start_marker(&self, condition: Condition) -> String {
        format!("{}_start", self.label(condition))
    }

    pub fn end_marker(&self, condition: Condition) -> String {
        format!("{}_end", self.label(condition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_labels() {
        let labels = ConditionLabels::new("spell", "meditate");
        assert_eq!(labels.start_marker(Condition::Active), "spell_start");
        assert_eq!(labels.end_marker(Condition::Active), "spell_end");
        assert_eq!(labels.start_marker(Condition::Rest), "meditate_start");
        assert_eq!(labels.end_marker(Condition::Rest), "meditate_end");
    }

    #[test]
    fn test_default_labels() {
        let labels = ConditionLabels::default();
        assert_eq!(labels.start_marker(Condition::Active), "focus_start");
        assert_eq!(labels.end_marker(Condition::Rest), "relaxation_end");
    }

    #[test]
    fn test_condition_serializes_lowercase() {
        let json = serde_json::to_string(&Condition::Rest).unwrap();
        assert_eq!(json, "\"rest\"");
    }
}
