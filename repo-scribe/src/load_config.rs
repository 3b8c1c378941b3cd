/// `load_config` module: loads the optional YAML config file into a typed [`CliConfig`].
///
/// This module is the only place where user-supplied YAML is parsed.
///
/// # Responsibilities
/// - Parse the `generation` section (model and service base URL) for the live generator
/// - Parse the `pipeline` section into the core [`PipelineConfig`]
/// - Reject unknown aggregation modes with a clear diagnostic
///
/// Every key is optional; an absent file section falls back to its defaults. Secrets never live
/// in this file: the API key comes from `--api-key` or the environment.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use repo_scribe_core::config::PipelineConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub generation: GenerationSection,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSection {
    pub model: String,
    pub base_url: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Loads a YAML config file. Returns a config ready for the CLI to merge flags into.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config = parse_config(&config_content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        e
    })?;
    info!(config_path = ?path_ref, model = %config.generation.model, "Parsed config YAML successfully");
    config.pipeline.trace_loaded();
    Ok(config)
}

/// Parse config text. An empty document yields the defaults.
pub fn parse_config(content: &str) -> Result<CliConfig> {
    if content.trim().is_empty() {
        return Ok(CliConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {e}"))
}
