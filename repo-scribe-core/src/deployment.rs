//! Deployment derivation.
//!
//! Four generation-backed stages, issued as [`AgentRole::DeploymentEngineer`], produce a
//! [`DeploymentConfigSet`]. The Kubernetes stage only runs when [`needs_kubernetes`] fires.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::contract::{AgentRole, GenerationTask, Generator, TemplateRenderer};
use crate::error::ScribeError;
use crate::snapshot::{AnalysisRecord, RepositorySnapshot};
use crate::stage::{execute, to_prompt_text, Stage, StageBacking, StageOutput, StageRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentConfigSet {
    pub dockerfile: String,
    /// Present only when the Kubernetes heuristic fired.
    pub kubernetes_config: Option<String>,
    pub ci_pipeline: String,
    pub environment_variables: Vec<String>,
}

/// True when a file path mentions Kubernetes or the architecture mentions microservices.
pub fn needs_kubernetes(snapshot: &RepositorySnapshot) -> bool {
    let has_kubernetes_files = snapshot
        .file_paths()
        .any(|path| path.to_lowercase().contains("kubernetes"));
    let has_microservices = snapshot
        .architecture_summary
        .to_lowercase()
        .contains("microservices");
    has_kubernetes_files || has_microservices
}

fn list_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").expect("list marker pattern is valid")
    })
}

/// Split the environment-variable response into described entries, list markers removed.
pub fn parse_environment_variables(response: &str) -> Vec<String> {
    response
        .lines()
        .map(|line| list_marker().replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

pub struct DockerfileStage;

impl Stage for DockerfileStage {
    fn name(&self) -> &'static str {
        "dockerfile"
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let snapshot = record.snapshot();
        let languages = to_prompt_text(self.name(), &snapshot.language_histogram)?;
        let dependencies = to_prompt_text(self.name(), &snapshot.dependencies)?;
        Ok(StageRequest::Generate(GenerationTask::new(
            AgentRole::DeploymentEngineer,
            format!(
                "Create a Dockerfile for the repository with these characteristics:\n\
                 Languages: {languages}\n\
                 Dependencies: {dependencies}\n\n\
                 Focus on:\n\
                 1. Appropriate base image selection\n\
                 2. Dependency installation\n\
                 3. Build and runtime stages if needed\n\
                 4. Security best practices\n\
                 5. Optimized layer caching"
            ),
            "A complete Dockerfile content with comments explaining each step",
        )))
    }
}

pub struct KubernetesStage;

impl Stage for KubernetesStage {
    fn name(&self) -> &'static str {
        "kubernetes"
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let snapshot = record.snapshot();
        Ok(StageRequest::Generate(GenerationTask::new(
            AgentRole::DeploymentEngineer,
            format!(
                "Create Kubernetes deployment and service configurations for:\n\
                 Application: {}\n\
                 Architecture: {}\n\n\
                 Include:\n\
                 1. Deployment configuration\n\
                 2. Service configuration\n\
                 3. ConfigMap/Secret templates if needed\n\
                 4. Resource requests/limits\n\
                 5. Health checks",
                snapshot.identity.name, snapshot.architecture_summary
            ),
            "Complete Kubernetes YAML configurations",
        )))
    }
}

pub struct CiPipelineStage;

impl Stage for CiPipelineStage {
    fn name(&self) -> &'static str {
        "ci_pipeline"
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let identity = &record.snapshot().identity;
        let branches = to_prompt_text(self.name(), &identity.branches)?;
        Ok(StageRequest::Generate(GenerationTask::new(
            AgentRole::DeploymentEngineer,
            format!(
                "Create a CI/CD pipeline configuration for:\n\
                 Repository: {}\n\
                 Branches: {branches}\n\n\
                 Include:\n\
                 1. Build steps\n\
                 2. Test execution\n\
                 3. Security scanning\n\
                 4. Deployment stages\n\
                 5. Environment-specific configurations",
                identity.name
            ),
            "A complete CI/CD pipeline configuration file",
        )))
    }
}

pub struct EnvironmentVariablesStage;

impl Stage for EnvironmentVariablesStage {
    fn name(&self) -> &'static str {
        "environment_variables"
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let snapshot = record.snapshot();
        let dependencies = to_prompt_text(self.name(), &snapshot.dependencies)?;
        let structure = to_prompt_text(self.name(), &snapshot.file_tree)?;
        Ok(StageRequest::Generate(GenerationTask::new(
            AgentRole::DeploymentEngineer,
            format!(
                "Analyze the codebase and identify required environment variables:\n\
                 Dependencies: {dependencies}\n\
                 File Structure: {structure}\n\n\
                 Focus on:\n\
                 1. Configuration variables\n\
                 2. API keys and credentials\n\
                 3. Database connections\n\
                 4. External service configurations"
            ),
            "A list of required environment variables with descriptions, one per line",
        )))
    }
}

/// Run the deployment stages in order and collect their outputs into a config set.
pub async fn derive_deployment<G, R>(
    record: &AnalysisRecord,
    generator: &G,
    renderer: &R,
) -> Result<(DeploymentConfigSet, Vec<StageOutput>), ScribeError>
where
    G: Generator + ?Sized,
    R: TemplateRenderer + ?Sized,
{
    let mut outputs = Vec::new();

    let dockerfile = execute(&DockerfileStage, record, generator, renderer).await?;
    let kubernetes = if needs_kubernetes(record.snapshot()) {
        info!("[DEPLOY] Kubernetes indicators found, deriving manifests");
        Some(execute(&KubernetesStage, record, generator, renderer).await?)
    } else {
        info!("[DEPLOY] No Kubernetes indicators, skipping manifests");
        None
    };
    let ci_pipeline = execute(&CiPipelineStage, record, generator, renderer).await?;
    let environment = execute(&EnvironmentVariablesStage, record, generator, renderer).await?;

    let set = DeploymentConfigSet {
        dockerfile: dockerfile.text.clone(),
        kubernetes_config: kubernetes.as_ref().map(|k| k.text.clone()),
        ci_pipeline: ci_pipeline.text.clone(),
        environment_variables: parse_environment_variables(&environment.text),
    };

    outputs.push(dockerfile);
    outputs.extend(kubernetes);
    outputs.push(ci_pipeline);
    outputs.push(environment);

    info!(
        kubernetes = set.kubernetes_config.is_some(),
        environment_variables = set.environment_variables.len(),
        "[DEPLOY] Deployment configuration derived"
    );
    Ok((set, outputs))
}
