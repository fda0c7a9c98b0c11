//! Timeline assembly and action dispatch.

use gsp_client::ReferenceServiceClient;
use gsp_core::{
    catalog, ActionRequest, ActionType, FaseDisponible, Phase, PhaseSnapshot, ProductionTimeline,
    ReferenceDetail, ReferenceId, Stage, Time,
};
use tracing::{debug, info, warn};
use crate::config::TimelineConfig;
use crate::error::TimelineError;
use crate::estimator::CompletionEstimator;

const OTHER_STAGE_SLUG: &str = "otros";
const OTHER_STAGE_NAME: &str = "Otros";
const GENERAL_AREA_CODE: &str = "GEN";
const GENERAL_AREA_NAME: &str = "General";

/// Owns the production timeline of one referencia.
///
/// The timeline is only ever replaced as a whole: by [`refresh_timeline`]
/// with a fresh read, or by [`perform_action`] with the snapshot the service
/// returns after a transition. Failed calls leave it untouched.
///
/// [`refresh_timeline`]: TimelineAssembler::refresh_timeline
/// [`perform_action`]: TimelineAssembler::perform_action
pub struct TimelineAssembler<C: ReferenceServiceClient> {
    client: C,
    config: TimelineConfig,
    estimator: CompletionEstimator,
    referencia_id: ReferenceId,
    phases: Vec<FaseDisponible>,
    timeline: Option<ProductionTimeline>,
    error: Option<TimelineError>,
    loading: bool,
}

impl<C: ReferenceServiceClient> TimelineAssembler<C> {
    /// Create an assembler for `referencia_id`. Nothing is loaded yet.
    pub fn new(client: C, config: TimelineConfig, referencia_id: ReferenceId) -> Self {
        Self {
            client,
            config,
            estimator: CompletionEstimator,
            referencia_id,
            phases: Vec::new(),
            timeline: None,
            error: None,
            loading: false,
        }
    }

    /// The referencia this assembler tracks.
    pub fn referencia_id(&self) -> &ReferenceId {
        &self.referencia_id
    }

    /// Last assembled timeline, if any.
    pub fn timeline(&self) -> Option<&ProductionTimeline> {
        self.timeline.as_ref()
    }

    /// Error of the last failed call, cleared by the next successful one.
    pub fn error(&self) -> Option<&TimelineError> {
        self.error.as_ref()
    }

    /// The last error as a display message.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Whether a call is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The injected configuration.
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Phases of the current timeline with their derived state.
    pub fn snapshots(&self, now: Time) -> Vec<PhaseSnapshot<'_>> {
        self.timeline
            .as_ref()
            .map(|t| t.snapshots(now))
            .unwrap_or_default()
    }

    /// Reload the referencia and rebuild the timeline.
    pub async fn refresh_timeline(&mut self) -> Result<(), TimelineError> {
        self.loading = true;
        let result = self.load().await;
        self.loading = false;

        match result {
            Ok((phases, timeline)) => {
                info!(
                    "Refreshed timeline of {} ({} phases, current {})",
                    self.referencia_id,
                    timeline.phase_count(),
                    timeline.current_phase
                );
                self.phases = phases;
                self.timeline = Some(timeline);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Refresh of {} failed: {}", self.referencia_id, e);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<(Vec<FaseDisponible>, ProductionTimeline), TimelineError> {
        let phases = self.client.available_phases(&self.referencia_id).await?;
        let detail = self.client.fetch_reference(&self.referencia_id).await?;
        let timeline = assemble_timeline(&detail, &phases, &self.config, &self.estimator);
        Ok((phases, timeline))
    }

    /// Ask the service to deliver or return a phase.
    ///
    /// Returns `true` when the service accepted the transition; the timeline
    /// is then replaced by the service's snapshot. On failure the timeline is
    /// unchanged and the error is available through [`error`].
    ///
    /// [`error`]: TimelineAssembler::error
    pub async fn perform_action(&mut self, request: ActionRequest) -> bool {
        if let Err(e) = self.validate(&request) {
            warn!("Rejected {} on {}: {}", request.action, request.phase_slug, e);
            self.error = Some(e);
            return false;
        }

        self.loading = true;
        let result = self
            .client
            .apply_action(&self.referencia_id, &request, &self.config.acting_user)
            .await;
        self.loading = false;

        match result {
            Ok(detail) => {
                let timeline =
                    assemble_timeline(&detail, &self.phases, &self.config, &self.estimator);
                info!(
                    "{} {} on {}, current phase now {}",
                    request.action, request.phase_slug, self.referencia_id, timeline.current_phase
                );
                self.timeline = Some(timeline);
                self.error = None;
                true
            }
            Err(e) => {
                let e = TimelineError::from(e);
                warn!(
                    "{} {} on {} failed: {}",
                    request.action, request.phase_slug, self.referencia_id, e
                );
                self.error = Some(e);
                false
            }
        }
    }

    fn validate(&self, request: &ActionRequest) -> Result<(), TimelineError> {
        let slug = request.phase_slug.trim();
        if slug.is_empty() {
            return Err(TimelineError::Validation("phase slug is required".into()));
        }
        if request.action == ActionType::Return && request.trimmed_notes().is_none() {
            return Err(TimelineError::Validation("a return requires notes".into()));
        }
        let timeline = self.timeline.as_ref().ok_or_else(|| {
            TimelineError::StaleState("timeline has not been loaded".into())
        })?;
        if timeline.phase(slug).is_none() {
            return Err(TimelineError::NotFound(format!("phase {slug}")));
        }
        Ok(())
    }
}

/// Build the timeline of `detail` over the ordered `phases`.
///
/// The service's phase order is kept. Consecutive phases of the same catalog
/// stage share one stage, and consecutive phases the catalog does not know
/// share an "otros" stage at their own position. A stage that shows up again
/// later in the list gets a numbered slug (`creacion-2`) so stage slugs stay
/// unique.
pub fn assemble_timeline(
    detail: &ReferenceDetail,
    phases: &[FaseDisponible],
    config: &TimelineConfig,
    estimator: &CompletionEstimator,
) -> ProductionTimeline {
    let mut stages: Vec<Stage> = Vec::new();
    // Catalog slug of each entry in `stages`, before numbering.
    let mut base_slugs: Vec<&str> = Vec::new();

    for fase in phases {
        let (base_slug, stage_name, phase) = match catalog::find_phase(&fase.slug) {
            Some((stage_config, phase_config)) => (
                stage_config.slug,
                stage_config.name,
                build_phase(detail, fase, phase_config.area_code, phase_config.area_name, config),
            ),
            None => {
                debug!("Phase {} is not in the catalog", fase.slug);
                (
                    OTHER_STAGE_SLUG,
                    OTHER_STAGE_NAME,
                    build_phase(detail, fase, GENERAL_AREA_CODE, GENERAL_AREA_NAME, config),
                )
            }
        };

        if let (Some(stage), Some(&last)) = (stages.last_mut(), base_slugs.last()) {
            if last == base_slug {
                stage.phases.push(phase);
                continue;
            }
        }

        let occurrence = base_slugs.iter().filter(|s| **s == base_slug).count() + 1;
        let slug = if occurrence == 1 {
            base_slug.to_string()
        } else {
            format!("{base_slug}-{occurrence}")
        };
        base_slugs.push(base_slug);
        stages.push(Stage {
            slug,
            name: stage_name.to_string(),
            phases: vec![phase],
        });
    }

    let total_estimated: f64 = stages.iter().map(Stage::estimated_duration).sum();
    ProductionTimeline {
        referencia_id: detail.referencia_id.clone(),
        collection_id: detail.collection_id.clone(),
        collection_name: detail.collection_name.clone(),
        current_phase: detail.current_phase.clone(),
        stages,
        start_date: detail.start_date,
        target_completion_date: estimator.target_completion(detail.start_date, total_estimated),
    }
}

fn build_phase(
    detail: &ReferenceDetail,
    fase: &FaseDisponible,
    area_code: &str,
    area_name: &str,
    config: &TimelineConfig,
) -> Phase {
    let mut phase = Phase::new(
        fase.slug.clone(),
        fase.nombre.clone(),
        area_code,
        area_name,
        config.metrics_for(&fase.slug),
    );
    let record = detail.record(&fase.slug);

    phase.responsible_user = record
        .and_then(|r| r.responsible_user.clone())
        .or_else(|| config.responsible_for(&fase.slug, area_code).map(str::to_string));
    if let Some(record) = record {
        phase.dates = record.dates.clone();
        phase.actions = record.actions.clone();
    }
    phase
}
