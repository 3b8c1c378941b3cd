use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// How commits are folded into contributor records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorAggregation {
    /// One record per (name, email) identity.
    #[default]
    Keyed,
    /// First-appearance linear scan comparing whole records, running count included.
    /// An identity whose count has moved past 1 no longer matches a fresh candidate,
    /// so the same author can appear in several records.
    Structural,
}

/// Pipeline-level settings that are not part of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub include_deployment: bool,
    pub contributor_aggregation: ContributorAggregation,
    /// Directory of templates overriding the bundled ones.
    pub templates_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_deployment: true,
            contributor_aggregation: ContributorAggregation::default(),
            templates_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            include_deployment = self.include_deployment,
            contributor_aggregation = ?self.contributor_aggregation,
            templates_dir = ?self.templates_dir,
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_deployment_and_keyed_aggregation() {
        let config = PipelineConfig::default();
        assert!(config.include_deployment);
        assert_eq!(config.contributor_aggregation, ContributorAggregation::Keyed);
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn aggregation_deserializes_from_snake_case() {
        let mode: ContributorAggregation = serde_json::from_str("\"structural\"").unwrap();
        assert_eq!(mode, ContributorAggregation::Structural);
        assert!(serde_json::from_str::<ContributorAggregation>("\"bogus\"").is_err());
    }

    #[test]
    fn unknown_pipeline_keys_are_rejected() {
        let err = serde_json::from_str::<PipelineConfig>(r#"{"include_deploymnet": false}"#)
            .unwrap_err();
        assert!(err.to_string().contains("include_deploymnet"), "got: {err}");
    }
}
