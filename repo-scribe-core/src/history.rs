//! Version-control reads: repository identity and contributor aggregation.
//!
//! Backed by libgit2 through `git2`. Every commit reachable from `HEAD` is enumerated; there is
//! no shortcut for the commit count.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Repository, Sort};
use tracing::{debug, error, info};

use crate::config::ContributorAggregation;
use crate::error::ScribeError;
use crate::snapshot::{ContributorRecord, RepositoryIdentity};

/// Stock text git writes into a fresh repository's `description` file.
const PLACEHOLDER_DESCRIPTION: &str = "Unnamed repository;";

/// Author identity of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// An opened, non-bare repository with a checked-out branch.
pub struct GitHistory {
    repo: Repository,
    workdir: PathBuf,
}

impl GitHistory {
    /// Open the repository rooted at `path`. Parent directories are not searched.
    pub fn open(path: &Path) -> Result<Self, ScribeError> {
        let repo = Repository::open(path).map_err(|e| {
            error!(error = %e, path = %path.display(), "Not a valid git repository");
            ScribeError::repository_state(path, format!("not a git repository: {}", e.message()))
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| ScribeError::repository_state(path, "bare repositories are not supported"))?
            .to_path_buf();
        debug!(workdir = %workdir.display(), "Opened git repository");
        Ok(Self { repo, workdir })
    }

    /// Name of the currently checked-out branch.
    pub fn active_branch(&self) -> Result<String, ScribeError> {
        let head = self.repo.head().map_err(|e| {
            let reason = if e.code() == ErrorCode::UnbornBranch {
                "HEAD points to a branch with no commits".to_string()
            } else {
                format!("cannot resolve HEAD: {}", e.message())
            };
            error!(error = %e, "Failed to resolve HEAD");
            ScribeError::repository_state(&self.workdir, reason)
        })?;
        if !head.is_branch() {
            error!(path = %self.workdir.display(), "HEAD is detached");
            return Err(ScribeError::repository_state(
                &self.workdir,
                "HEAD is detached; no branch is checked out",
            ));
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| ScribeError::repository_state(&self.workdir, "branch name is not valid UTF-8"))
    }

    /// Local branch names, sorted.
    pub fn branches(&self) -> Result<Vec<String>, ScribeError> {
        let mut names = Vec::new();
        let branches = self
            .repo
            .branches(Some(BranchType::Local))
            .map_err(|e| self.git_error("list branches", e))?;
        for branch in branches {
            let (branch, _) = branch.map_err(|e| self.git_error("read branch", e))?;
            if let Some(name) = branch.name().map_err(|e| self.git_error("read branch name", e))? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Contents of the repository's `description` file, if set to something meaningful.
    pub fn description(&self) -> Option<String> {
        let raw = std::fs::read_to_string(self.repo.path().join("description")).ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(PLACEHOLDER_DESCRIPTION) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Authors of every commit reachable from `HEAD`, newest first.
    pub fn commit_authors(&self) -> Result<Vec<CommitAuthor>, ScribeError> {
        let mut revwalk = self.repo.revwalk().map_err(|e| self.git_error("start revwalk", e))?;
        revwalk.push_head().map_err(|e| self.git_error("walk from HEAD", e))?;
        revwalk
            .set_sorting(Sort::TIME)
            .map_err(|e| self.git_error("sort revwalk", e))?;

        let mut authors = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(|e| self.git_error("walk history", e))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| self.git_error("read commit", e))?;
            let author = commit.author();
            authors.push(CommitAuthor {
                name: author.name().unwrap_or_default().to_string(),
                email: author.email().unwrap_or_default().to_string(),
            });
        }
        Ok(authors)
    }

    /// Identity block of the snapshot. `total_commits` is the number of commits walked.
    pub fn identity(&self, total_commits: usize) -> Result<RepositoryIdentity, ScribeError> {
        let default_branch = self.active_branch()?;
        let name = self
            .workdir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let identity = RepositoryIdentity {
            name,
            description: self.description(),
            default_branch,
            total_commits,
            branches: self.branches()?,
        };
        info!(
            name = %identity.name,
            default_branch = %identity.default_branch,
            total_commits,
            branches = identity.branches.len(),
            "[SNAPSHOT] Read repository identity"
        );
        Ok(identity)
    }

    fn git_error(&self, action: &str, e: git2::Error) -> ScribeError {
        error!(error = %e, action, "git operation failed");
        ScribeError::repository_state(&self.workdir, format!("failed to {action}: {}", e.message()))
    }
}

/// Fold commit authors into contributor records, in first-appearance order.
pub fn aggregate_contributors(
    authors: &[CommitAuthor],
    mode: ContributorAggregation,
) -> Vec<ContributorRecord> {
    match mode {
        ContributorAggregation::Keyed => aggregate_keyed(authors),
        ContributorAggregation::Structural => aggregate_structural(authors),
    }
}

fn aggregate_keyed(authors: &[CommitAuthor]) -> Vec<ContributorRecord> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut records: Vec<ContributorRecord> = Vec::new();
    for author in authors {
        match index.get(&(author.name.as_str(), author.email.as_str())) {
            Some(&i) => records[i].commit_count += 1,
            None => {
                index.insert((author.name.as_str(), author.email.as_str()), records.len());
                records.push(ContributorRecord::new(&author.name, &author.email));
            }
        }
    }
    records
}

fn aggregate_structural(authors: &[CommitAuthor]) -> Vec<ContributorRecord> {
    let mut records: Vec<ContributorRecord> = Vec::new();
    for author in authors {
        let candidate = ContributorRecord::new(&author.name, &author.email);
        match records.iter().position(|seen| *seen == candidate) {
            Some(i) => records[i].commit_count += 1,
            None => records.push(candidate),
        }
    }
    records
}
