//! Timeline configuration.
//!
//! Everything the assembler and the kanban view-model need besides the
//! catalog is injected through [`TimelineConfig`] at construction time.

use std::collections::HashMap;
use std::path::Path;
use gsp_client::MockConfig;
use gsp_core::{catalog, PhaseMetrics};
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Placeholder shown when nobody is assigned to a phase.
pub const UNASSIGNED: &str = "Sin asignar";

/// Longest duration a metric override may declare, in hours (ten years).
pub const MAX_METRIC_HOURS: f64 = 87_600.0;

/// Configuration of timeline assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Person in charge, keyed by phase slug or area code
    #[serde(default = "default_responsible_users")]
    pub responsible_users: HashMap<String, String>,

    /// Metric overrides keyed by phase slug
    #[serde(default)]
    pub phase_metrics: HashMap<String, PhaseMetrics>,

    /// Details text keyed by phase slug
    #[serde(default)]
    pub phase_details: HashMap<String, String>,

    /// User recorded on transitions
    #[serde(default = "default_acting_user")]
    pub acting_user: String,

    /// In-memory service settings
    #[serde(default)]
    pub mock: MockConfig,
}

fn default_acting_user() -> String {
    "sistema".to_string()
}

fn default_responsible_users() -> HashMap<String, String> {
    [
        ("JO", "Carolina Pérez"),
        ("MD", "Andrés Gómez"),
        ("DIS", "Valentina Ruiz"),
        ("COR", "Jorge Castaño"),
        ("MOD", "Luisa Martínez"),
        ("TEC", "Felipe Ramírez"),
        ("COS", "Diana López"),
        ("PRD", "Mauricio Torres"),
        ("LOG", "Sandra Mejía"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            responsible_users: default_responsible_users(),
            phase_metrics: HashMap::new(),
            phase_details: HashMap::new(),
            acting_user: default_acting_user(),
            mock: MockConfig::default(),
        }
    }
}

impl TimelineConfig {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every metric override is a finite, non-negative number of
    /// hours no larger than [`MAX_METRIC_HOURS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (slug, metrics) in &self.phase_metrics {
            for (field, hours) in [
                ("averageDuration", metrics.average_duration),
                ("estimatedDuration", metrics.estimated_duration),
            ] {
                if !hours.is_finite() || !(0.0..=MAX_METRIC_HOURS).contains(&hours) {
                    return Err(ConfigError::InvalidMetrics {
                        slug: slug.clone(),
                        reason: format!(
                            "{field} must be between 0 and {MAX_METRIC_HOURS} hours, got {hours}"
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Metrics for a phase: configured override, else the catalog default.
    pub fn metrics_for(&self, slug: &str) -> PhaseMetrics {
        self.phase_metrics
            .get(slug)
            .copied()
            .unwrap_or_else(|| catalog::default_phase_metrics(slug))
    }

    /// Person in charge of a phase, looked up by slug first and area second.
    pub fn responsible_for(&self, slug: &str, area_code: &str) -> Option<&str> {
        self.responsible_users
            .get(slug)
            .or_else(|| self.responsible_users.get(area_code))
            .map(String::as_str)
    }

    /// Details text of a phase.
    pub fn details_for(&self, slug: &str, name: &str, area_name: &str) -> String {
        match self.phase_details.get(slug) {
            Some(details) => details.clone(),
            None => format!("Fase {name} a cargo de {area_name}"),
        }
    }
}
