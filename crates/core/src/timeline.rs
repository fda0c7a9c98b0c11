//! Timeline model - the per-referencia aggregate of stages and phases.

use serde::{Deserialize, Serialize};
use crate::id::ReferenceId;
use crate::phase::{Phase, PhaseSnapshot, PhaseStatus};
use crate::status::calculate_phase_status;
use crate::Time;

/// An ordered group of phases sharing a production step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Stage slug
    pub slug: String,

    /// Display name
    pub name: String,

    /// Phases in production order
    pub phases: Vec<Phase>,
}

impl Stage {
    /// Sum of the phases' estimated durations, in hours.
    pub fn estimated_duration(&self) -> f64 {
        self.phases.iter().map(|p| p.metrics.estimated_duration).sum()
    }

    /// Sum of the measured durations of delivered phases, in hours.
    pub fn actual_duration(&self) -> f64 {
        self.phases.iter().filter_map(Phase::actual_duration).sum()
    }
}

/// Production timeline of one referencia within a collection.
///
/// Status, completion and permissions are derived from `current_phase` on
/// every read; nothing derived is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionTimeline {
    /// Referencia identifier
    pub referencia_id: ReferenceId,

    /// Collection identifier
    pub collection_id: String,

    /// Collection name
    pub collection_name: String,

    /// Current phase slug
    pub current_phase: String,

    /// Stages in production order
    pub stages: Vec<Stage>,

    /// When production started
    pub start_date: Time,

    /// Planned end of production
    pub target_completion_date: Time,
}

impl ProductionTimeline {
    /// All phases in production order.
    pub fn phases(&self) -> impl Iterator<Item = &Phase> {
        self.stages.iter().flat_map(|s| s.phases.iter())
    }

    /// Ordered copy of every phase, the shape the status calculator expects.
    fn ordered_phases(&self) -> Vec<Phase> {
        self.phases().cloned().collect()
    }

    /// Find a phase by slug.
    pub fn phase(&self, slug: &str) -> Option<&Phase> {
        self.phases().find(|p| p.slug == slug)
    }

    /// Position of a phase in production order.
    pub fn phase_index(&self, slug: &str) -> Option<usize> {
        self.phases().position(|p| p.slug == slug)
    }

    /// Number of phases.
    pub fn phase_count(&self) -> usize {
        self.stages.iter().map(|s| s.phases.len()).sum()
    }

    /// Status of one phase at `now`.
    pub fn phase_status(&self, slug: &str, now: Time) -> Option<PhaseStatus> {
        let phase = self.phase(slug)?;
        Some(calculate_phase_status(phase, &self.current_phase, &self.ordered_phases(), now))
    }

    /// Every phase with its derived state at `now`.
    pub fn snapshots(&self, now: Time) -> Vec<PhaseSnapshot<'_>> {
        let all = self.ordered_phases();
        self.phases()
            .enumerate()
            .map(|(i, phase)| {
                let status = calculate_phase_status(phase, &self.current_phase, &all, now);
                PhaseSnapshot::new(phase, status, i == 0)
            })
            .collect()
    }

    /// Number of phases completed at `now`.
    pub fn completed_count(&self, now: Time) -> usize {
        self.snapshots(now)
            .iter()
            .filter(|s| s.status == PhaseStatus::Completed)
            .count()
    }

    /// Completed phases over all phases, as a rounded percentage.
    pub fn completion_percentage(&self, now: Time) -> u8 {
        let total = self.phase_count();
        if total == 0 {
            return 0;
        }
        let completed = self.completed_count(now);
        (100.0 * completed as f64 / total as f64).round() as u8
    }

    /// Whether every phase is completed.
    pub fn is_completed(&self, now: Time) -> bool {
        let total = self.phase_count();
        total > 0 && self.completed_count(now) == total
    }

    /// Whether every phase of a stage is completed.
    pub fn stage_is_completed(&self, stage_slug: &str, now: Time) -> bool {
        let Some(stage) = self.stages.iter().find(|s| s.slug == stage_slug) else {
            return false;
        };
        let all = self.ordered_phases();
        !stage.phases.is_empty()
            && stage.phases.iter().all(|p| {
                calculate_phase_status(p, &self.current_phase, &all, now) == PhaseStatus::Completed
            })
    }

    /// Sum of estimated durations over all stages, in hours.
    pub fn total_estimated_duration(&self) -> f64 {
        self.stages.iter().map(Stage::estimated_duration).sum()
    }

    /// Sum of measured durations over all stages, in hours.
    pub fn total_actual_duration(&self) -> f64 {
        self.stages.iter().map(Stage::actual_duration).sum()
    }
}
