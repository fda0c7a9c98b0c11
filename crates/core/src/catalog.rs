//! Production stage catalog.
//!
//! The fixed sequence of production stages and phases every referencia goes
//! through, with the default duration metrics for each phase.

use crate::phase::PhaseMetrics;
use crate::reference::FaseDisponible;

/// Reserved current-phase slug once the last phase has been delivered.
pub const FINISHED_PHASE: &str = "finalizado";

/// Static description of a stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageConfig {
    /// Stage slug
    pub slug: &'static str,
    /// Display name
    pub name: &'static str,
    /// Phases in production order
    pub phases: &'static [PhaseConfig],
}

/// Static description of a phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseConfig {
    /// Phase slug
    pub slug: &'static str,
    /// Display name
    pub name: &'static str,
    /// Responsible area code
    pub area_code: &'static str,
    /// Responsible area name
    pub area_name: &'static str,
}

const fn phase(
    slug: &'static str,
    name: &'static str,
    area_code: &'static str,
    area_name: &'static str,
) -> PhaseConfig {
    PhaseConfig { slug, name, area_code, area_name }
}

/// All production stages, in order.
pub const PRODUCTION_STAGES: &[StageConfig] = &[
    StageConfig {
        slug: "creacion",
        name: "Creación",
        phases: &[
            phase("jo", "JO", "JO", "Jefatura de Producto"),
            phase("md-creacion", "MD Creación", "MD", "Merchandising"),
            phase("md-creativo", "MD Creativo", "DIS", "Diseño"),
        ],
    },
    StageConfig {
        slug: "desarrollo",
        name: "Desarrollo",
        phases: &[
            phase("corte", "Corte", "COR", "Corte"),
            phase("fitting", "Fitting", "MOD", "Modelaje"),
            phase("md-tecnico", "MD Técnico", "TEC", "Ficha Técnica"),
            phase("costeo", "Costeo", "COS", "Costos"),
        ],
    },
    StageConfig {
        slug: "produccion",
        name: "Producto Terminado",
        phases: &[
            phase("pt-tecnico", "PT Técnico", "TEC", "Ficha Técnica"),
            phase("pt-produccion", "PT Producción", "PRD", "Producción"),
            phase("pt-entrega", "PT Entrega", "LOG", "Logística"),
        ],
    },
];

/// Default metrics per phase slug, in hours (average, estimated).
pub const DEFAULT_PHASE_METRICS: &[(&str, PhaseMetrics)] = &[
    ("jo", metrics(16.0, 24.0)),
    ("md-creacion", metrics(30.0, 48.0)),
    ("md-creativo", metrics(60.0, 72.0)),
    ("corte", metrics(20.0, 24.0)),
    ("fitting", metrics(40.0, 48.0)),
    ("md-tecnico", metrics(36.0, 48.0)),
    ("costeo", metrics(18.0, 24.0)),
    ("pt-tecnico", metrics(30.0, 36.0)),
    ("pt-produccion", metrics(140.0, 168.0)),
    ("pt-entrega", metrics(20.0, 24.0)),
];

const fn metrics(average_duration: f64, estimated_duration: f64) -> PhaseMetrics {
    PhaseMetrics { average_duration, estimated_duration }
}

/// The production stages.
pub fn production_stages() -> &'static [StageConfig] {
    PRODUCTION_STAGES
}

/// Default metrics for a phase, falling back to [`PhaseMetrics::default`].
pub fn default_phase_metrics(slug: &str) -> PhaseMetrics {
    DEFAULT_PHASE_METRICS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, m)| *m)
        .unwrap_or_default()
}

/// Find a phase and the stage that owns it.
pub fn find_phase(slug: &str) -> Option<(&'static StageConfig, &'static PhaseConfig)> {
    PRODUCTION_STAGES.iter().find_map(|stage| {
        stage
            .phases
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| (stage, p))
    })
}

/// Every phase slug in production order.
pub fn all_phase_slugs() -> Vec<&'static str> {
    PRODUCTION_STAGES
        .iter()
        .flat_map(|s| s.phases.iter().map(|p| p.slug))
        .collect()
}

/// The whole catalog as the ordered phase list a reference service would report.
pub fn available_phases() -> Vec<FaseDisponible> {
    PRODUCTION_STAGES
        .iter()
        .flat_map(|s| s.phases.iter())
        .map(|p| FaseDisponible::new(p.slug, p.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugs_are_unique() {
        let slugs = all_phase_slugs();
        let unique: HashSet<_> = slugs.iter().collect();
        assert_eq!(slugs.len(), unique.len());
        assert!(!slugs.contains(&FINISHED_PHASE));
    }

    #[test]
    fn test_sequence_starts_with_jo_and_ends_with_pt() {
        let slugs = all_phase_slugs();
        assert_eq!(slugs.first(), Some(&"jo"));
        assert_eq!(slugs.last(), Some(&"pt-entrega"));
    }

    #[test]
    fn test_every_phase_has_default_metrics() {
        for slug in all_phase_slugs() {
            assert!(
                DEFAULT_PHASE_METRICS.iter().any(|(s, _)| *s == slug),
                "missing metrics for {slug}"
            );
        }
        assert_eq!(default_phase_metrics("unknown"), PhaseMetrics::default());
    }

    #[test]
    fn test_find_phase_returns_owning_stage() {
        let (stage, phase) = find_phase("fitting").unwrap();
        assert_eq!(stage.slug, "desarrollo");
        assert_eq!(phase.area_code, "MOD");
        assert!(find_phase("bordado").is_none());
    }
}
