//! # contract: boundaries to the collaborators the pipeline does not own
//!
//! This module defines the traits through which the core reaches the outside world:
//! - [`Generator`]: the generative text service that turns a task description into prose
//! - [`TemplateRenderer`]: the template engine used by template-backed stages and assembly
//! - [`DocumentSink`]: the persistence target for the final document
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall` so the orchestrator can be exercised without a
//!   network or a filesystem. Mocks are exported behind the default `test-export-mocks` feature.
//!
//! ## Errors
//! - All methods return [`ServiceError`]; callers wrap it into a [`crate::ScribeError`] without
//!   altering the message.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Serialize;

/// Error type returned by collaborators (simple boxed error).
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// The agent persona issuing a task. Each role has its own sampling temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Analyses the repository while the snapshot is built.
    Researcher,
    /// Derives deployment scaffolding from the snapshot.
    DeploymentEngineer,
    /// Writes the documentation sections.
    TechnicalWriter,
}

/// Role title, goal and backstory sent to the service as the system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl AgentRole {
    pub fn persona(self) -> Persona {
        match self {
            AgentRole::Researcher => Persona {
                role: "Research Analyst",
                goal: "Thoroughly analyze code repositories and extract key information",
                backstory: "You are an expert at analyzing code repositories and understanding \
                            software architecture. You have extensive experience in reviewing \
                            code bases and identifying patterns.",
            },
            AgentRole::DeploymentEngineer => Persona {
                role: "Deployment Engineer",
                goal: "Create comprehensive deployment configurations based on repository analysis",
                backstory: "You are an expert DevOps engineer with extensive experience in \
                            creating deployment configurations for various types of applications. \
                            You excel at analyzing codebases and determining the optimal \
                            deployment setup.",
            },
            AgentRole::TechnicalWriter => Persona {
                role: "Technical Writer",
                goal: "Create clear, comprehensive documentation from repository analysis",
                backstory: "You are an expert technical writer with years of experience in \
                            creating software documentation. You excel at explaining complex \
                            technical concepts in a clear and organized manner.",
            },
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            AgentRole::Researcher => 0.1,
            AgentRole::DeploymentEngineer => 0.3,
            AgentRole::TechnicalWriter => 0.7,
        }
    }
}

/// A natural-language task for the generative service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationTask {
    pub role: AgentRole,
    /// What the service is asked to do, with the relevant snapshot fields embedded.
    pub description: String,
    /// A description of the expected output, passed along verbatim.
    pub expected_output: String,
}

impl GenerationTask {
    pub fn new(
        role: AgentRole,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            role,
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Trait for the generative text service.
///
/// The response is opaque prose: no schema is enforced and nothing is validated.
/// Implementations perform a single blocking round-trip with no retry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Submit a task and return the service's free-text response.
    async fn generate(&self, task: &GenerationTask) -> Result<String, ServiceError>;
}

/// Trait for rendering a named template against a mapping of variables.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, ServiceError>;
}

/// Trait for persisting the final document.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait DocumentSink: Send + Sync {
    /// Write `content` to `destination`, creating missing parent directories.
    fn persist(&self, content: &str, destination: &Path) -> Result<(), ServiceError>;
}
