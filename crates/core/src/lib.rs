//! GSP core data models.
//!
//! This crate defines the production phase model of a referencia: the static
//! stage catalog, the phase/stage/timeline aggregate, and the pure status and
//! duration calculators. It performs no I/O.

#![warn(missing_docs)]

// Identities
mod id;

// Phase model
mod action;
mod phase;
mod reference;
mod timeline;

// Calculators and catalog
pub mod catalog;
pub mod duration;
pub mod status;

// Re-exports
pub use id::*;

pub use action::{Action, ActionType};
pub use phase::{
    can_deliver, can_return, Phase, PhaseDates, PhaseMetrics, PhaseSnapshot, PhaseStatus,
};
pub use reference::{ActionRequest, FaseDisponible, PhaseRecord, ReferenceDetail};
pub use timeline::{ProductionTimeline, Stage};

pub use catalog::{StageConfig, PhaseConfig, FINISHED_PHASE};
pub use duration::{calculate_duration, DurationError};
pub use status::calculate_phase_status;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
