//! In-memory reference service.
//!
//! Keeps referencias in memory and applies deliver/return transitions with the
//! same rules as the backend. Every call waits `MockConfig::delay_ms` first so
//! callers see realistic latency.

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use gsp_core::{
    catalog, Action, ActionRequest, ActionType, FaseDisponible, PhaseDates, ReferenceDetail,
    ReferenceId, Time, FINISHED_PHASE,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use super::{ClientError, ReferenceServiceClient, Result};

/// Configuration of the in-memory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency per call, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_delay_ms() -> u64 {
    300
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

/// In-memory reference service backend.
pub struct MockReferenceService {
    references: Mutex<HashMap<ReferenceId, ReferenceDetail>>,
    phases: HashMap<ReferenceId, Vec<FaseDisponible>>,
    default_phases: Vec<FaseDisponible>,
    config: MockConfig,
}

impl MockReferenceService {
    /// Create an empty service whose referencias follow the full catalog.
    pub fn new(config: MockConfig) -> Self {
        Self {
            references: Mutex::new(HashMap::new()),
            phases: HashMap::new(),
            default_phases: catalog::available_phases(),
            config,
        }
    }

    /// Override the phase list of one referencia.
    pub fn with_phases(mut self, id: ReferenceId, phases: Vec<FaseDisponible>) -> Self {
        self.phases.insert(id, phases);
        self
    }

    /// Store a referencia, replacing any previous one with the same id.
    pub async fn insert(&self, detail: ReferenceDetail) {
        self.references
            .lock()
            .await
            .insert(detail.referencia_id.clone(), detail);
    }

    /// Seed a demo referencia sitting at `current_phase`.
    ///
    /// Phases before the current one are delivered back to back from
    /// `start_date` using their default estimated durations; the current phase
    /// is received when its predecessor was delivered.
    pub async fn seed_demo(
        &self,
        id: ReferenceId,
        current_phase: &str,
        start_date: Time,
    ) -> ReferenceDetail {
        let phases = self.phases_for(&id).to_vec();
        let mut detail = ReferenceDetail {
            referencia_id: id.clone(),
            collection_id: "COL-2025-V".to_string(),
            collection_name: "Verano 2025".to_string(),
            current_phase: current_phase.to_string(),
            start_date,
            phases: Vec::new(),
        };

        let mut cursor = start_date;
        for fase in &phases {
            let record = detail.record_mut(&fase.slug);
            if fase.slug == current_phase {
                record.dates.received = Some(cursor);
                break;
            }
            let metrics = catalog::default_phase_metrics(&fase.slug);
            let delivered =
                gsp_core::duration::saturating_add_hours(cursor, metrics.estimated_duration);
            record.dates = PhaseDates {
                received: Some(cursor),
                delivered: Some(delivered),
            };
            record.actions.push(Action::new(ActionType::Deliver, "demo", delivered, None));
            cursor = delivered;
        }

        info!("Seeded demo referencia {} at phase {}", id, current_phase);
        self.insert(detail.clone()).await;
        detail
    }

    fn phases_for(&self, id: &ReferenceId) -> &[FaseDisponible] {
        self.phases.get(id).unwrap_or(&self.default_phases)
    }

    async fn simulate_latency(&self) {
        if self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }
    }
}

impl Default for MockReferenceService {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[async_trait]
impl ReferenceServiceClient for MockReferenceService {
    async fn fetch_reference(&self, id: &ReferenceId) -> Result<ReferenceDetail> {
        self.simulate_latency().await;
        self.references
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("referencia {id}")))
    }

    async fn available_phases(&self, id: &ReferenceId) -> Result<Vec<FaseDisponible>> {
        self.simulate_latency().await;
        if !self.references.lock().await.contains_key(id) {
            return Err(ClientError::NotFound(format!("referencia {id}")));
        }
        Ok(self.phases_for(id).to_vec())
    }

    async fn apply_action(
        &self,
        id: &ReferenceId,
        request: &ActionRequest,
        user: &str,
    ) -> Result<ReferenceDetail> {
        self.simulate_latency().await;

        let slugs: Vec<&str> = self.phases_for(id).iter().map(|f| f.slug.as_str()).collect();
        let mut references = self.references.lock().await;
        let detail = references
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(format!("referencia {id}")))?;

        apply_transition(detail, &slugs, request, user, Utc::now())?;
        debug!(
            "Applied {} on {} for {}, current phase now {}",
            request.action, request.phase_slug, id, detail.current_phase
        );
        Ok(detail.clone())
    }
}

/// Apply one transition to `detail` following the backend rules.
fn apply_transition(
    detail: &mut ReferenceDetail,
    slugs: &[&str],
    request: &ActionRequest,
    user: &str,
    now: Time,
) -> Result<()> {
    let slug = request.phase_slug.trim();
    if slug.is_empty() {
        return Err(ClientError::Validation("phase slug is required".into()));
    }
    let index = slugs
        .iter()
        .position(|s| *s == slug)
        .ok_or_else(|| ClientError::NotFound(format!("phase {slug}")))?;

    let current_index = if detail.current_phase == FINISHED_PHASE {
        Some(slugs.len())
    } else {
        slugs.iter().position(|s| *s == detail.current_phase)
    };

    match request.action {
        ActionType::Deliver => {
            if current_index != Some(index) {
                return Err(ClientError::StaleState(format!(
                    "phase {slug} is not the current phase ({})",
                    detail.current_phase
                )));
            }

            let record = detail.record_mut(slug);
            record.dates.delivered = Some(now);
            record.actions.push(Action::new(
                ActionType::Deliver,
                user,
                now,
                request.trimmed_notes().map(str::to_string),
            ));

            match slugs.get(index + 1) {
                Some(next) => {
                    let next_record = detail.record_mut(next);
                    next_record.dates = PhaseDates {
                        received: Some(now),
                        delivered: None,
                    };
                    detail.current_phase = next.to_string();
                }
                None => detail.current_phase = FINISHED_PHASE.to_string(),
            }
        }
        ActionType::Return => {
            let notes = request
                .trimmed_notes()
                .ok_or_else(|| ClientError::Validation("a return requires notes".into()))?
                .to_string();

            let eligible = index > 0 && current_index.is_some_and(|current| index < current);
            if !eligible {
                return Err(ClientError::StaleState(format!(
                    "phase {slug} cannot be returned while the current phase is {}",
                    detail.current_phase
                )));
            }

            // Phases after the returned one have to be received again.
            let upper = current_index.unwrap_or(slugs.len()).min(slugs.len() - 1);
            for later in &slugs[index + 1..=upper] {
                detail.record_mut(later).dates = PhaseDates::default();
            }

            let record = detail.record_mut(slug);
            record.dates = PhaseDates {
                received: Some(now),
                delivered: None,
            };
            record
                .actions
                .push(Action::new(ActionType::Return, user, now, Some(notes)));
            detail.current_phase = slug.to_string();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service() -> MockReferenceService {
        MockReferenceService::new(MockConfig { delay_ms: 0 })
    }

    fn start() -> Time {
        Utc.with_ymd_and_hms(2025, 2, 3, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let svc = service();
        let err = svc.fetch_reference(&ReferenceId::new("nope")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_seed_demo_delivers_previous_phases() {
        let svc = service();
        let detail = svc.seed_demo(ReferenceId::new("R1"), "corte", start()).await;

        assert_eq!(detail.current_phase, "corte");
        let jo = detail.record("jo").unwrap();
        assert_eq!(jo.dates.received, Some(start()));
        assert!(jo.dates.delivered.is_some());
        assert_eq!(jo.actions.len(), 1);

        let corte = detail.record("corte").unwrap();
        assert!(corte.dates.received.is_some());
        assert!(corte.dates.delivered.is_none());
        assert!(detail.record("fitting").is_none());
    }

    #[tokio::test]
    async fn test_deliver_advances_current_phase() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "corte", start()).await;

        let detail = svc
            .apply_action(&id, &ActionRequest::deliver("corte"), "ana")
            .await
            .unwrap();

        assert_eq!(detail.current_phase, "fitting");
        let corte = detail.record("corte").unwrap();
        assert!(corte.dates.delivered.is_some());
        assert_eq!(corte.actions.last().unwrap().user(), "ana");
        assert!(detail.record("fitting").unwrap().dates.received.is_some());
    }

    #[tokio::test]
    async fn test_deliver_last_phase_finishes() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "pt-entrega", start()).await;

        let detail = svc
            .apply_action(&id, &ActionRequest::deliver("pt-entrega"), "ana")
            .await
            .unwrap();
        assert_eq!(detail.current_phase, FINISHED_PHASE);
    }

    #[tokio::test]
    async fn test_deliver_non_current_is_stale() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "corte", start()).await;

        let err = svc
            .apply_action(&id, &ActionRequest::deliver("jo"), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::StaleState(_)));
    }

    #[tokio::test]
    async fn test_return_moves_current_back() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "fitting", start()).await;

        let detail = svc
            .apply_action(&id, &ActionRequest::return_phase("md-creativo", "falta ficha"), "luis")
            .await
            .unwrap();

        assert_eq!(detail.current_phase, "md-creativo");
        let returned = detail.record("md-creativo").unwrap();
        assert!(returned.dates.delivered.is_none());
        assert_eq!(returned.actions.last().unwrap().action_type(), ActionType::Return);
        assert_eq!(detail.record("corte").unwrap().dates, PhaseDates::default());
        assert_eq!(detail.record("fitting").unwrap().dates, PhaseDates::default());
    }

    #[tokio::test]
    async fn test_return_rules() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "corte", start()).await;

        // First phase
        let err = svc
            .apply_action(&id, &ActionRequest::return_phase("jo", "x"), "luis")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::StaleState(_)));

        // Not yet reached
        let err = svc
            .apply_action(&id, &ActionRequest::return_phase("costeo", "x"), "luis")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::StaleState(_)));

        // Missing notes
        let err = svc
            .apply_action(&id, &ActionRequest::return_phase("md-creacion", " "), "luis")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_return_after_finish() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "pt-entrega", start()).await;
        svc.apply_action(&id, &ActionRequest::deliver("pt-entrega"), "ana")
            .await
            .unwrap();

        let detail = svc
            .apply_action(&id, &ActionRequest::return_phase("pt-entrega", "etiquetas"), "luis")
            .await
            .unwrap();
        assert_eq!(detail.current_phase, "pt-entrega");
    }

    #[tokio::test]
    async fn test_unknown_phase_is_not_found() {
        let svc = service();
        let id = ReferenceId::new("R1");
        svc.seed_demo(id.clone(), "corte", start()).await;

        let err = svc
            .apply_action(&id, &ActionRequest::deliver("bordado"), "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_custom_phase_list() {
        let id = ReferenceId::new("R2");
        let svc = service().with_phases(
            id.clone(),
            vec![FaseDisponible::new("jo", "JO"), FaseDisponible::new("corte", "Corte")],
        );
        svc.seed_demo(id.clone(), "jo", start()).await;

        let phases = svc.available_phases(&id).await.unwrap();
        assert_eq!(phases.len(), 2);

        let detail = svc.apply_action(&id, &ActionRequest::deliver("jo"), "ana").await.unwrap();
        assert_eq!(detail.current_phase, "corte");
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let svc = MockReferenceService::new(MockConfig { delay_ms: 500 });
        svc.seed_demo(ReferenceId::new("R1"), "jo", start()).await;

        let before = tokio::time::Instant::now();
        svc.fetch_reference(&ReferenceId::new("R1")).await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(500));
    }
}
