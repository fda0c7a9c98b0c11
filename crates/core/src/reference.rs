//! Shapes exchanged with the reference service.

use serde::{Deserialize, Serialize};
use crate::action::{Action, ActionType};
use crate::id::ReferenceId;
use crate::phase::PhaseDates;
use crate::Time;

/// A phase available for a referencia, as listed by the reference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaseDisponible {
    /// Phase slug
    pub slug: String,

    /// Display name
    pub nombre: String,
}

impl FaseDisponible {
    /// Create an entry.
    pub fn new(slug: impl Into<String>, nombre: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            nombre: nombre.into(),
        }
    }
}

/// The reference service's view of one referencia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDetail {
    /// Referencia identifier
    pub referencia_id: ReferenceId,

    /// Collection identifier
    pub collection_id: String,

    /// Collection name
    pub collection_name: String,

    /// Slug of the phase the referencia is in
    pub current_phase: String,

    /// When production started
    pub start_date: Time,

    /// Per-phase progress, keyed by slug
    #[serde(default)]
    pub phases: Vec<PhaseRecord>,
}

impl ReferenceDetail {
    /// Record for a phase slug.
    pub fn record(&self, slug: &str) -> Option<&PhaseRecord> {
        self.phases.iter().find(|r| r.slug == slug)
    }

    /// Mutable record for a phase slug, created empty when missing.
    pub fn record_mut(&mut self, slug: &str) -> &mut PhaseRecord {
        if let Some(i) = self.phases.iter().position(|r| r.slug == slug) {
            return &mut self.phases[i];
        }
        self.phases.push(PhaseRecord::new(slug));
        let last = self.phases.len() - 1;
        &mut self.phases[last]
    }
}

/// Progress of one phase as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord {
    /// Phase slug
    pub slug: String,

    /// Person assigned by the backend, overriding configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_user: Option<String>,

    /// Reception and delivery dates
    #[serde(default)]
    pub dates: PhaseDates,

    /// Transition history, oldest first
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl PhaseRecord {
    /// Empty record for `slug`.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            responsible_user: None,
            dates: PhaseDates::default(),
            actions: Vec::new(),
        }
    }
}

/// A request to deliver or return a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    /// Target phase slug
    pub phase_slug: String,

    /// Transition to apply
    pub action: ActionType,

    /// Notes, mandatory for returns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ActionRequest {
    /// Deliver `phase_slug`.
    pub fn deliver(phase_slug: impl Into<String>) -> Self {
        Self {
            phase_slug: phase_slug.into(),
            action: ActionType::Deliver,
            notes: None,
        }
    }

    /// Return `phase_slug` with the reason in `notes`.
    pub fn return_phase(phase_slug: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            phase_slug: phase_slug.into(),
            action: ActionType::Return,
            notes: Some(notes.into()),
        }
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Notes with surrounding whitespace removed, `None` when blank.
    pub fn trimmed_notes(&self) -> Option<&str> {
        self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}
