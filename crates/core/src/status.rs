//! Phase status calculation.

use crate::catalog::FINISHED_PHASE;
use crate::phase::{Phase, PhaseStatus};
use crate::Time;

/// Compute the status of `phase` given the current phase of the referencia.
///
/// Position in `all_phases` decides the base status: before the current phase
/// is completed (or returned, when the last logged action was a return), the
/// current phase is current, and after it is pending. A current or pending
/// phase whose deadline (received date plus estimated duration) has passed at
/// `now` without a delivery is overdue.
///
/// When `current_phase_slug` is not in the list every phase is pending, unless
/// it is [`FINISHED_PHASE`], in which case every phase precedes it.
pub fn calculate_phase_status(
    phase: &Phase,
    current_phase_slug: &str,
    all_phases: &[Phase],
    now: Time,
) -> PhaseStatus {
    let base = positional_status(
        &phase.slug,
        phase.was_returned(),
        current_phase_slug,
        all_phases.iter().map(|p| p.slug.as_str()),
    );

    match base {
        PhaseStatus::Current | PhaseStatus::Pending if phase.is_past_deadline(now) => {
            PhaseStatus::Overdue
        }
        other => other,
    }
}

/// Position-only status, for callers that hold slugs rather than phases.
///
/// Never yields [`PhaseStatus::Overdue`].
pub fn positional_status<'a>(
    slug: &str,
    returned: bool,
    current_phase_slug: &str,
    ordered_slugs: impl IntoIterator<Item = &'a str>,
) -> PhaseStatus {
    if slug == current_phase_slug {
        return PhaseStatus::Current;
    }

    let slugs: Vec<&str> = ordered_slugs.into_iter().collect();
    let Some(position) = slugs.iter().position(|s| *s == slug) else {
        return PhaseStatus::Pending;
    };

    let current_position = if current_phase_slug == FINISHED_PHASE {
        Some(slugs.len())
    } else {
        slugs.iter().position(|s| *s == current_phase_slug)
    };

    match current_position {
        Some(current) if position < current => {
            if returned {
                PhaseStatus::Returned
            } else {
                PhaseStatus::Completed
            }
        }
        _ => PhaseStatus::Pending,
    }
}
