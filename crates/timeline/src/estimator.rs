//! Completion time estimation.

use gsp_core::duration::saturating_add_hours;
use gsp_core::{PhaseStatus, ProductionTimeline, Time};

/// Completion time estimator.
///
/// Phases are assumed to run back to back, each taking its estimated duration.
/// Dates clamp to the representable range instead of overflowing.
pub struct CompletionEstimator;

impl CompletionEstimator {
    /// Estimated start of each phase, given the durations in production order.
    pub fn phase_start_dates(
        &self,
        start: Time,
        durations: impl IntoIterator<Item = f64>,
    ) -> Vec<Time> {
        let mut cursor = start;
        durations
            .into_iter()
            .map(|hours| {
                let phase_start = cursor;
                cursor = saturating_add_hours(cursor, hours);
                phase_start
            })
            .collect()
    }

    /// Planned end of production.
    pub fn target_completion(&self, start: Time, total_hours: f64) -> Time {
        saturating_add_hours(start, total_hours)
    }

    /// Estimated hours still to go at `now`.
    pub fn remaining_hours(&self, timeline: &ProductionTimeline, now: Time) -> f64 {
        timeline
            .snapshots(now)
            .iter()
            .filter(|s| s.status != PhaseStatus::Completed)
            .map(|s| s.phase.metrics.estimated_duration)
            .sum()
    }

    /// Projected end of production at `now`.
    pub fn estimate_completion(&self, timeline: &ProductionTimeline, now: Time) -> Time {
        let remaining = self.remaining_hours(timeline, now);
        if remaining == 0.0 {
            return now;
        }
        saturating_add_hours(now, remaining)
    }
}

impl Default for CompletionEstimator {
    fn default() -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use gsp_core::{Phase, PhaseMetrics, ReferenceId, Stage, FINISHED_PHASE};

    fn timeline(current: &str) -> ProductionTimeline {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let phases = ["a", "b", "c"]
            .iter()
            .map(|s| {
                Phase::new(*s, *s, "X", "Area X", PhaseMetrics {
                    average_duration: 8.0,
                    estimated_duration: 10.0,
                })
            })
            .collect();
        ProductionTimeline {
            referencia_id: ReferenceId::new("R1"),
            collection_id: "C1".into(),
            collection_name: "Verano".into(),
            current_phase: current.to_string(),
            stages: vec![Stage { slug: "s".into(), name: "S".into(), phases }],
            start_date: start,
            target_completion_date: start + Duration::hours(30),
        }
    }

    #[test]
    fn test_phase_start_dates_accumulate() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let dates = CompletionEstimator.phase_start_dates(start, [24.0, 12.0, 6.0]);
        assert_eq!(
            dates,
            vec![start, start + Duration::hours(24), start + Duration::hours(36)]
        );
    }

    #[test]
    fn test_target_completion() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            CompletionEstimator.target_completion(start, 36.5),
            start + Duration::minutes(36 * 60 + 30)
        );
    }

    #[test]
    fn test_oversized_durations_clamp() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            CompletionEstimator.target_completion(start, 1e30),
            chrono::DateTime::<Utc>::MAX_UTC
        );
        let dates = CompletionEstimator.phase_start_dates(start, [1e30, 5.0]);
        assert_eq!(dates[0], start);
        assert_eq!(dates[1], chrono::DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_remaining_hours_skip_completed_phases() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap();
        assert_eq!(CompletionEstimator.remaining_hours(&timeline("a"), now), 30.0);
        assert_eq!(CompletionEstimator.remaining_hours(&timeline("c"), now), 10.0);
        assert_eq!(
            CompletionEstimator.estimate_completion(&timeline("b"), now),
            now + Duration::hours(20)
        );
        assert_eq!(CompletionEstimator.estimate_completion(&timeline(FINISHED_PHASE), now), now);
    }
}
