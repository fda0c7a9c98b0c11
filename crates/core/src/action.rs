//! Action model - the per-phase transition log.

use crate::id::ActionId;
use crate::Time;
use serde::{Deserialize, Serialize};

/// Kind of transition recorded against a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Work on the phase was handed to the next phase.
    Deliver,
    /// Delivered work was sent back to the phase for rework.
    Return,
}

impl ActionType {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Deliver => "deliver",
            ActionType::Return => "return",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deliver" | "entregar" => Ok(ActionType::Deliver),
            "return" | "devolver" => Ok(ActionType::Return),
            other => Err(format!("unknown action type: {other}")),
        }
    }
}

/// An entry of a phase's action history.
///
/// Entries are appended by the reference service and never modified
/// afterwards; the fields are read-only outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    id: ActionId,

    #[serde(rename = "type")]
    action_type: ActionType,

    timestamp: Time,

    user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Action {
    /// Record a new action at `timestamp`.
    pub fn new(
        action_type: ActionType,
        user: impl Into<String>,
        timestamp: Time,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            action_type,
            timestamp,
            user: user.into(),
            notes,
        }
    }

    /// Entry identifier.
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Transition kind.
    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    /// When the transition happened.
    pub fn timestamp(&self) -> Time {
        self.timestamp
    }

    /// Who performed it.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Free-form notes, required for returns.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_action_type_parse_accepts_spanish_aliases() {
        assert_eq!("entregar".parse::<ActionType>().unwrap(), ActionType::Deliver);
        assert_eq!("Devolver".parse::<ActionType>().unwrap(), ActionType::Return);
        assert!("archive".parse::<ActionType>().is_err());
    }

    #[test]
    fn test_action_serializes_type_field() {
        let ts = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let action = Action::new(ActionType::Return, "ana", ts, Some("costura abierta".into()));
        let json = serde_json::to_value(&action).unwrap();

        assert_eq!(json["type"], "return");
        assert_eq!(json["user"], "ana");
        assert_eq!(json["notes"], "costura abierta");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }
}
