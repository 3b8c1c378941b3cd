//! Enrichment Stage Interface.
//!
//! A stage reads the current [`AnalysisRecord`] and describes the work needed to produce its
//! named output: either a task for the generative service or a template to render. Stages never
//! touch the record; [`execute`] performs the request and returns the output verbatim.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::contract::{GenerationTask, Generator, TemplateRenderer};
use crate::error::ScribeError;
use crate::snapshot::AnalysisRecord;

/// Where a stage's output comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageBacking {
    Generated,
    Templated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageRequest {
    Generate(GenerationTask),
    Render {
        template: &'static str,
        context: serde_json::Value,
    },
}

impl StageRequest {
    pub fn backing(&self) -> StageBacking {
        match self {
            StageRequest::Generate(_) => StageBacking::Generated,
            StageRequest::Render { .. } => StageBacking::Templated,
        }
    }
}

pub trait Stage: Send + Sync {
    /// Name of the key this stage's output is merged under.
    fn name(&self) -> &'static str;

    fn backing(&self) -> StageBacking;

    fn request(&self, record: &AnalysisRecord) -> Result<StageRequest, ScribeError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    pub name: &'static str,
    pub backing: StageBacking,
    pub text: String,
}

/// Serialize a snapshot field for embedding into a task description or template context.
pub(crate) fn to_context<T: Serialize + ?Sized>(
    stage: &str,
    value: &T,
) -> Result<serde_json::Value, ScribeError> {
    serde_json::to_value(value)
        .map_err(|e| ScribeError::Template(format!("stage '{stage}' could not serialize its input: {e}")))
}

/// Compact JSON text of a snapshot field, for task descriptions.
pub(crate) fn to_prompt_text<T: Serialize + ?Sized>(
    stage: &str,
    value: &T,
) -> Result<String, ScribeError> {
    Ok(to_context(stage, value)?.to_string())
}

/// Run one stage against the collaborators.
pub async fn execute<S, G, R>(
    stage: &S,
    record: &AnalysisRecord,
    generator: &G,
    renderer: &R,
) -> Result<StageOutput, ScribeError>
where
    S: Stage + ?Sized,
    G: Generator + ?Sized,
    R: TemplateRenderer + ?Sized,
{
    let name = stage.name();
    let request = stage.request(record)?;
    let backing = request.backing();
    info!(stage = name, ?backing, "[STAGE] Running stage");

    let text = match request {
        StageRequest::Generate(task) => {
            debug!(stage = name, description = %task.description, "Submitting generation task");
            generator.generate(&task).await.map_err(|source| {
                error!(stage = name, error = %source, "Generation-backed stage failed");
                ScribeError::ExternalService {
                    stage: name.to_string(),
                    source,
                }
            })?
        }
        StageRequest::Render { template, context } => {
            renderer.render(template, &context).map_err(|e| {
                error!(stage = name, template, error = %e, "Template-backed stage failed");
                ScribeError::Template(format!("stage '{name}' failed to render '{template}': {e}"))
            })?
        }
    };

    info!(stage = name, bytes = text.len(), "[STAGE] Stage finished");
    Ok(StageOutput {
        name,
        backing,
        text,
    })
}
