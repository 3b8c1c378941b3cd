//! Repository Snapshot Builder.
//!
//! Produces the single [`RepositorySnapshot`] a run works from. History, the two tree walks and
//! the manifest check are local reads; the architecture summary and the design pattern list are
//! delegated to the generative service as [`AgentRole::Researcher`] tasks.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::ContributorAggregation;
use crate::contract::{AgentRole, GenerationTask, Generator};
use crate::error::ScribeError;
use crate::history::{aggregate_contributors, GitHistory};
use crate::manifests::analyze_dependencies;
use crate::snapshot::RepositorySnapshot;
use crate::walk::{detect_languages, walk_file_tree};

pub struct SnapshotBuilder {
    repo_path: PathBuf,
    aggregation: ContributorAggregation,
}

impl SnapshotBuilder {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            aggregation: ContributorAggregation::default(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: ContributorAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Build the snapshot. Any error from the generative service is returned as-is, wrapped once.
    pub async fn build<G>(&self, generator: &G) -> Result<RepositorySnapshot, ScribeError>
    where
        G: Generator + ?Sized,
    {
        let root = self.repo_path.as_path();
        if !root.exists() {
            error!(path = %root.display(), "Repository path does not exist");
            return Err(ScribeError::InvalidArgument(format!(
                "repository path does not exist: {}",
                root.display()
            )));
        }
        info!(path = %root.display(), aggregation = ?self.aggregation, "[SNAPSHOT] Building repository snapshot");

        // libgit2 handles are not Send, so history is read before any await point.
        let (identity, contributors) = {
            let history = GitHistory::open(root)?;
            let authors = history.commit_authors()?;
            let identity = history.identity(authors.len())?;
            let contributors = aggregate_contributors(&authors, self.aggregation);
            info!(
                contributors = contributors.len(),
                "[SNAPSHOT] Aggregated contributors"
            );
            (identity, contributors)
        };

        let file_tree = walk_file_tree(root)?;
        let language_histogram = detect_languages(root)?;
        let architecture_summary = identify_architecture(generator, root).await?;
        let design_patterns = identify_patterns(generator, root).await?;
        let dependencies = analyze_dependencies(root)?;

        info!(
            name = %identity.name,
            total_commits = identity.total_commits,
            patterns = design_patterns.len(),
            "[SNAPSHOT] Repository snapshot complete"
        );
        Ok(RepositorySnapshot {
            identity,
            file_tree,
            language_histogram,
            architecture_summary,
            design_patterns,
            contributors,
            dependencies,
        })
    }
}

pub fn architecture_task(root: &Path) -> GenerationTask {
    GenerationTask::new(
        AgentRole::Researcher,
        format!(
            "Analyze the codebase at {} and identify the main architectural pattern used.",
            root.display()
        ),
        "A detailed description of the architectural pattern used in the codebase",
    )
}

pub fn patterns_task(root: &Path) -> GenerationTask {
    GenerationTask::new(
        AgentRole::Researcher,
        format!(
            "Analyze the codebase at {} and list the main design patterns used.",
            root.display()
        ),
        "A list of design patterns found in the codebase",
    )
}

/// Split a free-text pattern list on line breaks only. Empty entries are kept.
pub fn split_patterns(response: &str) -> Vec<String> {
    response.split('\n').map(str::to_string).collect()
}

async fn identify_architecture<G>(generator: &G, root: &Path) -> Result<String, ScribeError>
where
    G: Generator + ?Sized,
{
    generator
        .generate(&architecture_task(root))
        .await
        .map_err(|source| {
            error!(error = %source, "[SNAPSHOT] Architecture identification failed");
            ScribeError::ExternalService {
                stage: "architecture_summary".into(),
                source,
            }
        })
}

async fn identify_patterns<G>(generator: &G, root: &Path) -> Result<Vec<String>, ScribeError>
where
    G: Generator + ?Sized,
{
    let response = generator
        .generate(&patterns_task(root))
        .await
        .map_err(|source| {
            error!(error = %source, "[SNAPSHOT] Design pattern identification failed");
            ScribeError::ExternalService {
                stage: "design_patterns".into(),
                source,
            }
        })?;
    Ok(split_patterns(&response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockGenerator;

    #[test]
    fn patterns_split_on_newlines_only() {
        let patterns = split_patterns("Observer, Factory\n\n- Singleton\r\nBuilder");
        assert_eq!(
            patterns,
            vec!["Observer, Factory", "", "- Singleton\r", "Builder"]
        );
    }

    #[test]
    fn researcher_tasks_embed_repository_path() {
        let root = Path::new("/work/demo");
        let task = architecture_task(root);
        assert_eq!(task.role, AgentRole::Researcher);
        assert!(task.description.contains("/work/demo"));
        assert!(patterns_task(root).description.contains("/work/demo"));
    }

    #[tokio::test]
    async fn missing_path_is_invalid_argument() {
        let generator = MockGenerator::new();
        let err = SnapshotBuilder::new("/definitely/not/here/repo-scribe")
            .build(&generator)
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::InvalidArgument(_)), "got {err:?}");
    }
}
