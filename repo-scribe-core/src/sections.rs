//! Documentation section stages.
//!
//! `overview`, `architecture`, `code_analysis` and `deployment` are written by the generative
//! service as [`AgentRole::TechnicalWriter`]. `structure`, `contributors` and `dependencies` are
//! rendered from static templates with no generative call.

use serde_json::json;

use crate::contract::{AgentRole, GenerationTask};
use crate::error::ScribeError;
use crate::snapshot::AnalysisRecord;
use crate::stage::{to_context, to_prompt_text, Stage, StageBacking, StageRequest};
use crate::template::{CONTRIBUTORS_TEMPLATE, DEPENDENCIES_TEMPLATE, STRUCTURE_TEMPLATE};

pub const OVERVIEW: &str = "overview";
pub const ARCHITECTURE: &str = "architecture";
pub const CODE_ANALYSIS: &str = "code_analysis";
pub const STRUCTURE: &str = "structure";
pub const CONTRIBUTORS: &str = "contributors";
pub const DEPENDENCIES: &str = "dependencies";
pub const DEPLOYMENT: &str = "deployment";

/// Section names always produced, in build order.
pub const BASE_SECTIONS: [&str; 6] = [
    OVERVIEW,
    ARCHITECTURE,
    CODE_ANALYSIS,
    STRUCTURE,
    CONTRIBUTORS,
    DEPENDENCIES,
];

/// Sections expected by the assembler for a record with or without deployment data.
pub fn required_sections(with_deployment: bool) -> Vec<&'static str> {
    let mut names = BASE_SECTIONS.to_vec();
    if with_deployment {
        names.push(DEPLOYMENT);
    }
    names
}

/// The section stages for `record`, in the fixed build order.
pub fn section_stages(record: &AnalysisRecord) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(OverviewSection),
        Box::new(ArchitectureSection),
        Box::new(CodeAnalysisSection),
        Box::new(StructureSection),
        Box::new(ContributorsSection),
        Box::new(DependenciesSection),
    ];
    if record.deployment().is_some() {
        stages.push(Box::new(DeploymentSection));
    }
    stages
}

fn writer_task(description: String, expected_output: &str) -> StageRequest {
    StageRequest::Generate(GenerationTask::new(
        AgentRole::TechnicalWriter,
        description,
        expected_output,
    ))
}

pub struct OverviewSection;

impl Stage for OverviewSection {
    fn name(&self) -> &'static str {
        OVERVIEW
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let identity = to_prompt_text(OVERVIEW, &record.snapshot().identity)?;
        Ok(writer_task(
            format!(
                "Create a clear overview section for the repository documentation \
                 using this information: {identity}\n\n\
                 Focus on:\n\
                 1. Repository name and purpose\n\
                 2. Key statistics (branches, commits)\n\
                 3. High-level description"
            ),
            "A comprehensive overview section for the documentation",
        ))
    }
}

pub struct ArchitectureSection;

impl Stage for ArchitectureSection {
    fn name(&self) -> &'static str {
        ARCHITECTURE
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        Ok(writer_task(
            format!(
                "Create a detailed architecture section based on this analysis:\n{}\n\n\
                 Explain:\n\
                 1. The overall architectural pattern\n\
                 2. Key components and their interactions\n\
                 3. Design decisions and their rationale",
                record.snapshot().architecture_summary
            ),
            "A detailed description of the repository's architecture",
        ))
    }
}

pub struct CodeAnalysisSection;

impl Stage for CodeAnalysisSection {
    fn name(&self) -> &'static str {
        CODE_ANALYSIS
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let snapshot = record.snapshot();
        let analysis = to_prompt_text(
            CODE_ANALYSIS,
            &json!({
                "languages": snapshot.language_histogram,
                "architecture": snapshot.architecture_summary,
                "patterns": snapshot.design_patterns,
            }),
        )?;
        Ok(writer_task(
            format!(
                "Create a comprehensive code analysis section using this information:\n{analysis}\n\n\
                 Include:\n\
                 1. Programming languages used and their distribution\n\
                 2. Design patterns identified\n\
                 3. Code organization and structure"
            ),
            "A detailed analysis of the codebase",
        ))
    }
}

pub struct StructureSection;

impl Stage for StructureSection {
    fn name(&self) -> &'static str {
        STRUCTURE
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Templated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        Ok(StageRequest::Render {
            template: STRUCTURE_TEMPLATE,
            context: json!({ "structure": to_context(STRUCTURE, &record.snapshot().file_tree)? }),
        })
    }
}

pub struct ContributorsSection;

impl Stage for ContributorsSection {
    fn name(&self) -> &'static str {
        CONTRIBUTORS
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Templated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        Ok(StageRequest::Render {
            template: CONTRIBUTORS_TEMPLATE,
            context: json!({
                "contributors": to_context(CONTRIBUTORS, &record.snapshot().contributors)?
            }),
        })
    }
}

pub struct DependenciesSection;

impl Stage for DependenciesSection {
    fn name(&self) -> &'static str {
        DEPENDENCIES
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Templated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        Ok(StageRequest::Render {
            template: DEPENDENCIES_TEMPLATE,
            context: json!({
                "dependencies": to_context(DEPENDENCIES, &record.snapshot().dependencies)?
            }),
        })
    }
}

pub struct DeploymentSection;

impl Stage for DeploymentSection {
    fn name(&self) -> &'static str {
        DEPLOYMENT
    }

    fn backing(&self) -> StageBacking {
        StageBacking::Generated
    }

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError> {
        let deployment = record.deployment().ok_or_else(|| {
            ScribeError::InvalidArgument("deployment section requires deployment data".into())
        })?;
        let kubernetes = deployment.kubernetes_config.as_deref().unwrap_or("None");
        let environment = to_prompt_text(DEPLOYMENT, &deployment.environment_variables)?;
        Ok(writer_task(
            format!(
                "Create a comprehensive deployment section using these configurations:\n\
                 Docker: {}\n\
                 Kubernetes: {kubernetes}\n\
                 CI/CD: {}\n\
                 Environment Variables: {environment}\n\n\
                 Include:\n\
                 1. Detailed explanation of deployment approach\n\
                 2. Instructions for building and deploying\n\
                 3. Configuration details\n\
                 4. Environment setup requirements",
                deployment.dockerfile, deployment.ci_pipeline
            ),
            "A detailed deployment configuration section",
        ))
    }
}
