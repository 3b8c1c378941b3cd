//! Data model of a repository analysis.
//!
//! A [`RepositorySnapshot`] is built once per run by [`crate::analyze::SnapshotBuilder`] and never
//! changed afterwards. The orchestrator wraps it in an [`AnalysisRecord`], which can gain a
//! deployment entry exactly once and is then read by every documentation stage.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::deployment::DeploymentConfigSet;
use crate::error::ScribeError;

/// Key used in [`FileTree`] for the repository root.
pub const ROOT_KEY: &str = "/";

/// Value recorded for a manifest that exists but is not parsed.
pub const UNPARSED_MANIFEST: &str = "Found but not parsed";

/// Relative directory path → file names directly inside it.
pub type FileTree = BTreeMap<String, Vec<String>>;

/// Lowercase extension (with leading dot) → number of files.
pub type LanguageHistogram = BTreeMap<String, usize>;

/// Ecosystem → manifest file name → content.
pub type DependencyReport = BTreeMap<String, BTreeMap<String, ManifestContent>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryIdentity {
    pub name: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub total_commits: usize,
    pub branches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorRecord {
    pub name: String,
    pub email: String,
    pub commit_count: usize,
}

impl ContributorRecord {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            commit_count: 1,
        }
    }
}

/// Content of a dependency manifest found at the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestContent {
    /// A line-delimited list such as `requirements.txt`.
    Lines(Vec<String>),
    /// A structured manifest that is recorded as present only.
    Unparsed,
}

impl Serialize for ManifestContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ManifestContent::Lines(lines) => lines.serialize(serializer),
            ManifestContent::Unparsed => serializer.serialize_str(UNPARSED_MANIFEST),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySnapshot {
    pub identity: RepositoryIdentity,
    pub file_tree: FileTree,
    pub language_histogram: LanguageHistogram,
    /// Free text from the generative service, not validated.
    pub architecture_summary: String,
    /// The service's response split on line breaks; entries may be empty.
    pub design_patterns: Vec<String>,
    pub contributors: Vec<ContributorRecord>,
    pub dependencies: DependencyReport,
}

impl RepositorySnapshot {
    /// Sum of all contributor commit counts.
    pub fn contribution_total(&self) -> usize {
        self.contributors.iter().map(|c| c.commit_count).sum()
    }

    /// Full relative path of every file in the tree, root files without a directory prefix.
    pub fn file_paths(&self) -> impl Iterator<Item = String> + '_ {
        self.file_tree.iter().flat_map(|(dir, files)| {
            files.iter().map(move |file| {
                if dir == ROOT_KEY {
                    file.clone()
                } else {
                    format!("{dir}/{file}")
                }
            })
        })
    }
}

/// The snapshot plus the additions made by enrichment stages.
///
/// Additions are append-only: a key is set once and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    #[serde(flatten)]
    snapshot: RepositorySnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployment: Option<DeploymentConfigSet>,
}

impl AnalysisRecord {
    pub fn new(snapshot: RepositorySnapshot) -> Self {
        Self {
            snapshot,
            deployment: None,
        }
    }

    pub fn snapshot(&self) -> &RepositorySnapshot {
        &self.snapshot
    }

    pub fn deployment(&self) -> Option<&DeploymentConfigSet> {
        self.deployment.as_ref()
    }

    /// Merge deployment data under the `deployment` key. Fails if it is already present.
    pub fn with_deployment(mut self, deployment: DeploymentConfigSet) -> Result<Self, ScribeError> {
        if self.deployment.is_some() {
            return Err(ScribeError::InvalidArgument(
                "analysis record already carries deployment data".into(),
            ));
        }
        self.deployment = Some(deployment);
        Ok(self)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_snapshot;
    use super::*;

    #[test]
    fn unparsed_manifest_serializes_as_sentinel() {
        let json = serde_json::to_value(ManifestContent::Unparsed).unwrap();
        assert_eq!(json, serde_json::json!(UNPARSED_MANIFEST));
        let json = serde_json::to_value(ManifestContent::Lines(vec!["x".into()])).unwrap();
        assert_eq!(json, serde_json::json!(["x"]));
    }

    #[test]
    fn file_paths_join_directory_and_name() {
        let paths: Vec<String> = sample_snapshot().file_paths().collect();
        assert!(paths.contains(&"a.py".to_string()));
        assert!(paths.contains(&"deploy/service.yaml".to_string()));
    }

    #[test]
    fn deployment_merges_once() {
        let deployment = DeploymentConfigSet {
            dockerfile: "FROM scratch".into(),
            kubernetes_config: None,
            ci_pipeline: "steps: []".into(),
            environment_variables: vec![],
        };
        let record = AnalysisRecord::new(sample_snapshot())
            .with_deployment(deployment.clone())
            .expect("first merge succeeds");
        assert_eq!(record.deployment(), Some(&deployment));
        assert!(record.with_deployment(deployment).is_err());
    }

    #[test]
    fn record_serializes_snapshot_fields_at_top_level() {
        let json = serde_json::to_value(AnalysisRecord::new(sample_snapshot())).unwrap();
        assert!(json.get("identity").is_some());
        assert!(json.get("deployment").is_none());
    }
}
