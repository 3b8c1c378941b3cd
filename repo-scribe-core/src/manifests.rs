//! Dependency manifests at the repository root.
//!
//! Only fixed, well-known file names are checked; there is no recursive search. Line-delimited
//! manifests are split into a list, structured ones are recorded as present.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, error, info};

use crate::error::ScribeError;
use crate::snapshot::{DependencyReport, ManifestContent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestKind {
    LineList,
    Structured,
}

/// Ecosystem name → manifests checked for it, in order.
const ECOSYSTEMS: &[(&str, &[(&str, ManifestKind)])] = &[
    (
        "python",
        &[
            ("requirements.txt", ManifestKind::LineList),
            ("setup.py", ManifestKind::Structured),
            ("pyproject.toml", ManifestKind::Structured),
            ("Pipfile", ManifestKind::Structured),
        ],
    ),
    ("javascript", &[("package.json", ManifestKind::Structured)]),
    ("rust", &[("Cargo.toml", ManifestKind::Structured)]),
    ("go", &[("go.mod", ManifestKind::Structured)]),
];

/// Non-blank lines of a line-delimited manifest, right-trimmed.
pub fn parse_line_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Inspect `root` for known manifests. Every ecosystem appears in the result, possibly empty.
pub fn analyze_dependencies(root: &Path) -> Result<DependencyReport, ScribeError> {
    let mut report = DependencyReport::new();
    for (ecosystem, manifests) in ECOSYSTEMS {
        let mut found = BTreeMap::new();
        for (file_name, kind) in *manifests {
            let path = root.join(file_name);
            if !path.exists() {
                continue;
            }
            let content = match kind {
                ManifestKind::LineList => {
                    let raw = std::fs::read_to_string(&path).map_err(|e| {
                        error!(error = %e, path = %path.display(), "Failed to read manifest");
                        ScribeError::io(&path, e)
                    })?;
                    ManifestContent::Lines(parse_line_list(&raw))
                }
                ManifestKind::Structured => ManifestContent::Unparsed,
            };
            debug!(ecosystem, manifest = file_name, "Found dependency manifest");
            found.insert(file_name.to_string(), content);
        }
        report.insert(ecosystem.to_string(), found);
    }
    info!(
        manifests = report.values().map(BTreeMap::len).sum::<usize>(),
        "[SNAPSHOT] Analyzed dependency manifests"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn requirements_lines_are_listed() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("requirements.txt"),
            "requests==2.31.0\n\nflask>=3\r\n  \njinja2\n",
        )
        .unwrap();
        fs::write(tmp.path().join("pyproject.toml"), "[project]\n").unwrap();

        let report = analyze_dependencies(tmp.path()).unwrap();
        let python = &report["python"];
        assert_eq!(
            python["requirements.txt"],
            ManifestContent::Lines(vec![
                "requests==2.31.0".into(),
                "flask>=3".into(),
                "jinja2".into()
            ])
        );
        assert_eq!(python["pyproject.toml"], ManifestContent::Unparsed);
        assert!(!python.contains_key("setup.py"));
    }

    #[test]
    fn every_ecosystem_is_reported() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        let report = analyze_dependencies(tmp.path()).unwrap();
        let keys: Vec<&str> = report.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["go", "javascript", "python", "rust"]);
        assert_eq!(report["javascript"]["package.json"], ManifestContent::Unparsed);
        assert!(report["python"].is_empty());
    }

    #[test]
    fn nested_manifests_are_ignored() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("web")).unwrap();
        fs::write(tmp.path().join("web/package.json"), "{}").unwrap();
        let report = analyze_dependencies(tmp.path()).unwrap();
        assert!(report["javascript"].is_empty());
    }
}
