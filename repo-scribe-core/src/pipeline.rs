//! High-level pipeline: snapshot → deployment → sections → assembly → persistence.
//!
//! This module provides the top-level orchestration for one documentation run. It:
//!   - Builds the [`RepositorySnapshot`](crate::snapshot::RepositorySnapshot) once
//!   - Optionally derives deployment configuration and merges it into the record
//!   - Runs every documentation section stage against the (possibly enriched) record
//!   - Assembles the sections through the main template and hands the document to the sink
//!
//! # Major Types
//! - [`PipelineRequest`]: what to analyse and where to write
//! - [`PipelineReport`]: what ran, how many generative calls were made, and what was written
//!
//! # Responsibilities
//! - Strictly sequential: one stage at a time, in a fixed order, no stage output reused
//! - Fail-fast: the first error ends the run and nothing is written
//! - Every run gets a fresh v4 run id carried on the `pipeline` tracing span
//!
//! # Error Handling
//! Stage and collaborator failures are returned as [`ScribeError`] untouched; the command
//! surface turns them into a message and exit status.
//!
//! # Navigation
//! - Main entrypoint: [`generate_documentation`]

use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::analyze::SnapshotBuilder;
use crate::assemble::{assemble, DocumentationSections};
use crate::config::PipelineConfig;
use crate::contract::{DocumentSink, Generator, TemplateRenderer};
use crate::deployment::derive_deployment;
use crate::error::ScribeError;
use crate::sections::{required_sections, section_stages};
use crate::snapshot::AnalysisRecord;
use crate::stage::{execute, StageBacking, StageOutput};

/// Generative calls made while the snapshot is built (architecture and design patterns).
pub const SNAPSHOT_GENERATIVE_CALLS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub repo_path: PathBuf,
    pub output_path: PathBuf,
    pub include_deployment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedStage {
    pub name: &'static str,
    pub backing: StageBacking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub output_path: PathBuf,
    /// Deployment and section stages, in execution order.
    pub stages: Vec<ExecutedStage>,
    /// Includes the calls made by the snapshot builder.
    pub generative_calls: usize,
    pub deployment_included: bool,
    pub kubernetes_included: bool,
    pub document_bytes: usize,
    /// Lowercase hex SHA-256 of the document text handed to the sink.
    pub document_sha256: String,
}

impl PipelineReport {
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }
}

/// Entrypoint: run the whole pipeline for `request`.
///
/// Deployment runs only when both the request and `config` allow it.
pub async fn generate_documentation<G, R, S>(
    request: &PipelineRequest,
    config: &PipelineConfig,
    generator: &G,
    renderer: &R,
    sink: &S,
) -> Result<PipelineReport, ScribeError>
where
    G: Generator + ?Sized,
    R: TemplateRenderer + ?Sized,
    S: DocumentSink + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("pipeline", %run_id, repo = %request.repo_path.display());
    run(run_id, request, config, generator, renderer, sink)
        .instrument(span)
        .await
}

async fn run<G, R, S>(
    run_id: Uuid,
    request: &PipelineRequest,
    config: &PipelineConfig,
    generator: &G,
    renderer: &R,
    sink: &S,
) -> Result<PipelineReport, ScribeError>
where
    G: Generator + ?Sized,
    R: TemplateRenderer + ?Sized,
    S: DocumentSink + ?Sized,
{
    info!("[PIPELINE] Starting documentation run");

    if !request.repo_path.exists() {
        error!("[PIPELINE][ERROR] Repository path does not exist");
        return Err(ScribeError::InvalidArgument(format!(
            "repository path does not exist: {}",
            request.repo_path.display()
        )));
    }

    // Step 1: snapshot
    let snapshot = SnapshotBuilder::new(&request.repo_path)
        .with_aggregation(config.contributor_aggregation)
        .build(generator)
        .await?;
    let mut record = AnalysisRecord::new(snapshot);
    let mut executed: Vec<StageOutput> = Vec::new();

    // Step 2: deployment
    let include_deployment = request.include_deployment && config.include_deployment;
    if include_deployment {
        info!("[PIPELINE] Deriving deployment configuration");
        let (deployment, outputs) = derive_deployment(&record, generator, renderer).await?;
        record = record.with_deployment(deployment)?;
        executed.extend(outputs);
    } else {
        info!("[PIPELINE] Deployment derivation disabled");
    }

    // Step 3: sections
    let mut sections = DocumentationSections::new();
    let stages = section_stages(&record);
    info!(count = stages.len(), "[SECTIONS] Building documentation sections");
    for stage in stages {
        let output = execute(stage.as_ref(), &record, generator, renderer).await?;
        sections.insert(output.name, output.text.clone())?;
        executed.push(output);
    }

    // Step 4: assemble and persist
    let required = required_sections(record.deployment().is_some());
    let document = assemble(renderer, sections, &required)?;
    sink.persist(&document, &request.output_path).map_err(|source| {
        error!(error = %source, path = %request.output_path.display(), "[PIPELINE][ERROR] Persist failed");
        ScribeError::Persistence {
            path: request.output_path.clone(),
            source,
        }
    })?;

    let generative_calls = SNAPSHOT_GENERATIVE_CALLS
        + executed
            .iter()
            .filter(|o| o.backing == StageBacking::Generated)
            .count();
    let report = PipelineReport {
        run_id,
        output_path: request.output_path.clone(),
        stages: executed
            .iter()
            .map(|o| ExecutedStage {
                name: o.name,
                backing: o.backing,
            })
            .collect(),
        generative_calls,
        deployment_included: record.deployment().is_some(),
        kubernetes_included: record
            .deployment()
            .is_some_and(|d| d.kubernetes_config.is_some()),
        document_bytes: document.len(),
        document_sha256: hex_digest(&document),
    };
    info!(
        stages = report.stages.len(),
        generative_calls = report.generative_calls,
        bytes = report.document_bytes,
        sha256 = %report.document_sha256,
        "[PIPELINE] Documentation run complete"
    );
    Ok(report)
}

fn hex_digest(document: &str) -> String {
    Sha256::digest(document.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex() {
        assert_eq!(
            hex_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn missing_repository_fails_before_any_collaborator() {
        use crate::contract::{MockDocumentSink, MockGenerator, MockTemplateRenderer};

        let mut generator = MockGenerator::new();
        generator.expect_generate().never();
        let renderer = MockTemplateRenderer::new();
        let mut sink = MockDocumentSink::new();
        sink.expect_persist().never();

        let request = PipelineRequest {
            repo_path: "/definitely/not/here/repo-scribe".into(),
            output_path: "documentation.md".into(),
            include_deployment: true,
        };
        let err = generate_documentation(
            &request,
            &PipelineConfig::default(),
            &generator,
            &renderer,
            &sink,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ScribeError::InvalidArgument(_)), "got {err:?}");
    }
}
