//! Phase model - a single production step of a referencia.

use serde::{Deserialize, Serialize};
use crate::action::{Action, ActionType};
use crate::duration::{checked_add_hours, hours_between};
use crate::Time;

/// A production phase of one referencia.
///
/// The phase carries no status of its own: status and the deliver/return
/// permissions are derived from the timeline's current phase on every read
/// (see [`PhaseSnapshot`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Slug, unique within a timeline
    pub slug: String,

    /// Display name
    pub name: String,

    /// Responsible area code
    pub area_code: String,

    /// Responsible area name
    pub area_name: String,

    /// Person in charge
    pub responsible_user: Option<String>,

    /// Reception and delivery dates
    #[serde(default)]
    pub dates: PhaseDates,

    /// Transition history, oldest first
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Duration metrics
    pub metrics: PhaseMetrics,
}

impl Phase {
    /// Create a phase with no dates or history.
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        area_code: impl Into<String>,
        area_name: impl Into<String>,
        metrics: PhaseMetrics,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            area_code: area_code.into(),
            area_name: area_name.into(),
            responsible_user: None,
            dates: PhaseDates::default(),
            actions: Vec::new(),
            metrics,
        }
    }

    /// Most recent action in the history.
    pub fn last_action(&self) -> Option<&Action> {
        self.actions.last()
    }

    /// Whether the most recent action sent the phase back.
    pub fn was_returned(&self) -> bool {
        self.last_action()
            .is_some_and(|a| a.action_type() == ActionType::Return)
    }

    /// Received date plus the estimated duration, `None` when either is unusable.
    pub fn deadline(&self) -> Option<Time> {
        let received = self.dates.received?;
        checked_add_hours(received, self.metrics.estimated_duration)
    }

    /// Whether the deadline passed at `now` without a delivery.
    pub fn is_past_deadline(&self, now: Time) -> bool {
        if self.dates.delivered.is_some() {
            return false;
        }
        self.deadline().is_some_and(|deadline| now > deadline)
    }

    /// Hours between reception and delivery, when both are known.
    pub fn actual_duration(&self) -> Option<f64> {
        match (self.dates.received, self.dates.delivered) {
            (Some(received), Some(delivered)) => Some(hours_between(received, delivered)),
            _ => None,
        }
    }
}

/// Phase status, always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    /// Not reached yet
    Pending,
    /// The phase the referencia is in
    Current,
    /// Delivered and passed
    Completed,
    /// Current or pending past its deadline without delivery
    Overdue,
    /// Passed, but its last action sent it back
    Returned,
}

impl PhaseStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::Current => "current",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Overdue => "overdue",
            PhaseStatus::Returned => "returned",
        }
    }

    /// Label shown on boards.
    pub fn label(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "Pendiente",
            PhaseStatus::Current => "En curso",
            PhaseStatus::Completed => "Completada",
            PhaseStatus::Overdue => "Vencida",
            PhaseStatus::Returned => "Devuelta",
        }
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reception and delivery dates of a phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseDates {
    /// When the phase received the work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<Time>,

    /// When the phase delivered it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered: Option<Time>,
}

/// Duration metrics of a phase, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseMetrics {
    /// Historical average
    pub average_duration: f64,

    /// Planned duration, used for deadlines and estimates
    pub estimated_duration: f64,
}

impl Default for PhaseMetrics {
    fn default() -> Self {
        Self {
            average_duration: 24.0,
            estimated_duration: 24.0,
        }
    }
}

/// Read-time view of a phase with its derived state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSnapshot<'a> {
    /// The phase
    #[serde(flatten)]
    pub phase: &'a Phase,

    /// Derived status
    pub status: PhaseStatus,

    /// Whether the phase may be delivered now
    pub can_deliver: bool,

    /// Whether the phase may be returned now
    pub can_return: bool,
}

impl<'a> PhaseSnapshot<'a> {
    /// Derive the permission flags from `status` and the phase position.
    pub fn new(phase: &'a Phase, status: PhaseStatus, is_first: bool) -> Self {
        Self {
            phase,
            status,
            can_deliver: can_deliver(status),
            can_return: can_return(status, is_first),
        }
    }
}

/// Deliver is allowed only on the current phase.
pub fn can_deliver(status: PhaseStatus) -> bool {
    status == PhaseStatus::Current
}

/// Return is allowed on a completed phase other than the first one.
pub fn can_return(status: PhaseStatus, is_first: bool) -> bool {
    status == PhaseStatus::Completed && !is_first
}
