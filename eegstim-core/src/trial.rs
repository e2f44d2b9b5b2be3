use serde::Serialize;

use crate::Condition;

/// Mental-arithmetic prompt: count backwards from `start` in steps of `decrement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payload {
    pub start: u32,
    pub decrement: u32,
}

/// One presented phase. Active trials always carry a payload, rest trials never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trial {
    condition: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Payload>,
}

impl Trial {
    pub fn active(payload: Payload) -> Self {
        Self {
            condition: Condition::Active,
            payload: Some(payload),
        }
    }

    pub fn rest() -> Self {
        Self {
            condition: Condition::Rest,
            payload: None,
        }
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn payload(&self) -> Option<Payload> {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_trial_serializes_without_payload() {
        let json = serde_json::to_value(Trial::rest()).unwrap();
        assert_eq!(json, serde_json::json!({ "condition": "rest" }));
    }

    #[test]
    fn test_active_trial_carries_payload() {
        let trial = Trial::active(Payload {
            start: 731,
            decrement: 7,
        });
        assert!(trial.condition().is_active());
        assert_eq!(trial.payload().map(|p| p.start), Some(731));
    }
}
