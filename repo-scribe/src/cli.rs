///
/// This module implements the CLI interface for repo-scribe: argument parsing, validation,
/// credential resolution and the async entrypoint.
///
/// All analysis and pipeline logic lives in the [`repo-scribe-core`] crate. This module is
/// strictly glue: it turns flags and the optional config file into a [`PipelineRequest`] and a
/// [`PipelineConfig`], wires up the live generator, and reports the outcome.
///
/// ## How To Use
/// - For command-line users: run the installed `repo-scribe` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`repo-scribe-core`]: ../../repo-scribe-core/
use crate::generate::OpenAiClient;
use crate::load_config::{load_config, CliConfig};
use anyhow::Result;
use clap::Parser;
use repo_scribe_core::config::PipelineConfig;
use repo_scribe_core::persist::FileSink;
use repo_scribe_core::pipeline::{generate_documentation, PipelineReport, PipelineRequest};
use repo_scribe_core::template::TemplateEngine;
use repo_scribe_core::ScribeError;
use std::path::PathBuf;

/// Environment variable consulted when `--api-key` is absent.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// CLI for repo-scribe: generate documentation for a local git repository.
#[derive(Parser, Debug)]
#[clap(
    name = "repo-scribe",
    version,
    about = "Generate documentation for a Git repository using a generative text service"
)]
pub struct Cli {
    /// Path to the Git repository
    #[clap(long)]
    pub repo: PathBuf,

    /// Where to save the documentation; a .html/.htm name produces HTML
    #[clap(long, default_value = "documentation.md")]
    pub output: PathBuf,

    /// API key. If not provided, OPENAI_API_KEY is read from the environment
    #[clap(long)]
    pub api_key: Option<String>,

    /// Optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory of templates replacing the bundled ones
    #[clap(long)]
    pub templates: Option<PathBuf>,

    /// Skip deployment derivation and the deployment section
    #[clap(long)]
    pub skip_deployment: bool,

    /// Model name sent to the generative service
    #[clap(long)]
    pub model: Option<String>,
}

/// Credential from the flag, else from the environment. Empty values count as missing.
pub fn resolve_api_key(flag: Option<&str>) -> Result<String, ScribeError> {
    let key = match flag {
        Some(key) => Some(key.to_string()),
        None => std::env::var(API_KEY_ENV).ok(),
    };
    match key {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => {
            tracing::error!("No API key supplied via --api-key or {API_KEY_ENV}");
            Err(ScribeError::MissingCredential(format!(
                "set the {API_KEY_ENV} environment variable, add it to a .env file, \
                 or pass --api-key"
            )))
        }
    }
}

/// Flags take precedence over the config file.
fn merge_pipeline_config(cli: &Cli, file: &CliConfig) -> PipelineConfig {
    let mut pipeline = file.pipeline.clone();
    if cli.skip_deployment {
        pipeline.include_deployment = false;
    }
    if let Some(dir) = &cli.templates {
        pipeline.templates_dir = Some(dir.clone());
    }
    pipeline
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<PipelineReport> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    if !cli.repo.exists() {
        tracing::error!(repo = %cli.repo.display(), "Repository path does not exist");
        return Err(ScribeError::InvalidArgument(format!(
            "Repository path does not exist: {}",
            cli.repo.display()
        ))
        .into());
    }

    let file_config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    let api_key = resolve_api_key(cli.api_key.as_deref())?;

    let pipeline = merge_pipeline_config(&cli, &file_config);
    pipeline.trace_loaded();
    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| file_config.generation.model.clone());

    let generator = OpenAiClient::new(api_key, model, file_config.generation.base_url.clone());
    let renderer = TemplateEngine::from_config(pipeline.templates_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load templates: {e}"))?;

    let request = PipelineRequest {
        repo_path: cli.repo.clone(),
        output_path: cli.output.clone(),
        include_deployment: pipeline.include_deployment,
    };

    println!("Analyzing repository: {}", cli.repo.display());
    match generate_documentation(&request, &pipeline, &generator, &renderer, &FileSink).await {
        Ok(report) => {
            tracing::info!(run_id = %report.run_id, ?report, "Documentation run complete");
            println!("Documentation generated successfully: {}", cli.output.display());
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, class = ?e.class(), "Documentation run failed");
            Err(e.into())
        }
    }
}
