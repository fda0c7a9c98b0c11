//! Kanban view-model.
//!
//! Flat, board-ready state of each phase derived from the phase list of a
//! referencia and its current phase. Pure and synchronous; recompute it
//! whenever the inputs change.

use gsp_core::status::positional_status;
use gsp_core::{can_deliver, can_return, catalog, FaseDisponible, PhaseStatus, Time};
use serde::Serialize;
use crate::config::{TimelineConfig, UNASSIGNED};
use crate::estimator::CompletionEstimator;

/// One card of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanPhase {
    /// Phase slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Position in production order, from 0
    pub position: usize,
    /// Derived status
    pub status: PhaseStatus,
    /// Person in charge
    pub responsible: String,
    /// Estimated start date
    pub estimated_start: Time,
    /// Details text
    pub details: String,
    /// Whether the phase may be delivered
    pub can_deliver: bool,
    /// Whether the phase may be returned
    pub can_return: bool,
}

/// Derives [`KanbanPhase`] cards.
pub struct KanbanViewModel;

impl KanbanViewModel {
    /// Derive the cards for `fases` with `current_phase_slug` as current.
    ///
    /// Start dates assume each phase begins when the previous one's estimated
    /// duration has elapsed since `start_date`.
    pub fn derive(
        fases: &[FaseDisponible],
        current_phase_slug: &str,
        start_date: Time,
        config: &TimelineConfig,
    ) -> Vec<KanbanPhase> {
        let starts = CompletionEstimator.phase_start_dates(
            start_date,
            fases.iter().map(|f| config.metrics_for(&f.slug).estimated_duration),
        );
        let slugs: Vec<&str> = fases.iter().map(|f| f.slug.as_str()).collect();

        fases
            .iter()
            .zip(starts)
            .enumerate()
            .map(|(position, (fase, estimated_start))| {
                let status =
                    positional_status(&fase.slug, false, current_phase_slug, slugs.iter().copied());
                let (area_code, area_name) = catalog::find_phase(&fase.slug)
                    .map(|(_, p)| (p.area_code, p.area_name))
                    .unwrap_or(("", "General"));

                KanbanPhase {
                    slug: fase.slug.clone(),
                    name: fase.nombre.clone(),
                    position,
                    status,
                    responsible: config
                        .responsible_for(&fase.slug, area_code)
                        .unwrap_or(UNASSIGNED)
                        .to_string(),
                    estimated_start,
                    details: config.details_for(&fase.slug, &fase.nombre, area_name),
                    can_deliver: can_deliver(status),
                    can_return: can_return(status, position == 0),
                }
            })
            .collect()
    }

    /// The card of the current phase, if the current slug is on the board.
    pub fn current(cards: &[KanbanPhase]) -> Option<&KanbanPhase> {
        cards.iter().find(|c| c.status == PhaseStatus::Current)
    }
}
