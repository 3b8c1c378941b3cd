mod common;

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use repo_scribe_core::config::PipelineConfig;
use repo_scribe_core::contract::{
    AgentRole, MockDocumentSink, MockGenerator, MockTemplateRenderer,
};
use repo_scribe_core::persist::FileSink;
use repo_scribe_core::pipeline::{generate_documentation, PipelineRequest};
use repo_scribe_core::stage::StageBacking;
use repo_scribe_core::template::TemplateEngine;
use repo_scribe_core::ErrorClass;
use tempfile::{tempdir, TempDir};

use common::{commit_all, init_repo, write_files};

fn sample_repo(extra: &[(&str, &str)]) -> TempDir {
    let tmp = tempdir().unwrap();
    let repo = init_repo(tmp.path());
    write_files(
        tmp.path(),
        &[("a.py", "print(1)\n"), ("b.py", "print(2)\n"), ("README", "hello\n")],
    );
    write_files(tmp.path(), extra);
    commit_all(&repo, "Ada", "ada@example.com", "initial");
    tmp
}

/// A generator that answers every task with a role-tagged line and counts calls.
fn counting_generator(calls: Arc<AtomicUsize>) -> MockGenerator {
    let mut generator = MockGenerator::new();
    generator.expect_generate().returning(move |task| {
        calls.fetch_add(1, Ordering::SeqCst);
        let tag = match task.role {
            AgentRole::Researcher => "research",
            AgentRole::DeploymentEngineer => "deploy",
            AgentRole::TechnicalWriter => "writer",
        };
        Ok(format!("{tag}: {}", task.expected_output))
    });
    generator
}

fn request(repo: &TempDir, output: &std::path::Path, include_deployment: bool) -> PipelineRequest {
    PipelineRequest {
        repo_path: repo.path().to_path_buf(),
        output_path: output.to_path_buf(),
        include_deployment,
    }
}

#[tokio::test]
async fn without_deployment_makes_five_generative_calls() {
    let repo = sample_repo(&[]);
    let out = tempdir().unwrap();
    let output = out.path().join("documentation.md");
    let calls = Arc::new(AtomicUsize::new(0));

    let report = generate_documentation(
        &request(&repo, &output, false),
        &PipelineConfig::default(),
        &counting_generator(calls.clone()),
        &TemplateEngine::bundled().unwrap(),
        &FileSink,
    )
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(report.generative_calls, 5);
    assert!(!report.deployment_included);
    assert_eq!(
        report.stage_names(),
        vec![
            "overview",
            "architecture",
            "code_analysis",
            "structure",
            "contributors",
            "dependencies"
        ]
    );
    let templated: Vec<&str> = report
        .stages
        .iter()
        .filter(|s| s.backing == StageBacking::Templated)
        .map(|s| s.name)
        .collect();
    assert_eq!(templated, vec!["structure", "contributors", "dependencies"]);

    let document = fs::read_to_string(&output).unwrap();
    assert_eq!(document.len(), report.document_bytes);
    assert_eq!(report.document_sha256.len(), 64);
    assert!(document.contains("## Overview"));
    assert!(document.contains("a.py"));
    assert!(document.contains("ada@example.com"));
    assert!(!document.contains("## Deployment"));
}

#[tokio::test]
async fn deployment_without_kubernetes_makes_nine_calls() {
    let repo = sample_repo(&[]);
    let out = tempdir().unwrap();
    let output = out.path().join("docs/documentation.md");
    let calls = Arc::new(AtomicUsize::new(0));

    let report = generate_documentation(
        &request(&repo, &output, true),
        &PipelineConfig::default(),
        &counting_generator(calls.clone()),
        &TemplateEngine::bundled().unwrap(),
        &FileSink,
    )
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 9);
    assert_eq!(report.generative_calls, 9);
    assert!(report.deployment_included);
    assert!(!report.kubernetes_included);
    assert_eq!(report.stage_names().last(), Some(&"deployment"));

    let document = fs::read_to_string(&output).unwrap();
    assert!(document.contains("## Deployment"));
    assert!(document.contains("writer: A detailed deployment configuration section"));
}

#[tokio::test]
async fn kubernetes_files_bring_the_total_to_ten_calls() {
    let repo = sample_repo(&[("kubernetes/deployment.yaml", "kind: Deployment\n")]);
    let out = tempdir().unwrap();
    let output = out.path().join("documentation.html");
    let calls = Arc::new(AtomicUsize::new(0));

    let report = generate_documentation(
        &request(&repo, &output, true),
        &PipelineConfig::default(),
        &counting_generator(calls.clone()),
        &TemplateEngine::bundled().unwrap(),
        &FileSink,
    )
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert!(report.kubernetes_included);
    assert_eq!(
        report.stage_names()[..4],
        ["dockerfile", "kubernetes", "ci_pipeline", "environment_variables"]
    );

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<h1>Repository Documentation</h1>"), "got: {html}");
}

#[tokio::test]
async fn config_can_disable_deployment() {
    let repo = sample_repo(&[]);
    let out = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let config = PipelineConfig {
        include_deployment: false,
        ..PipelineConfig::default()
    };

    let report = generate_documentation(
        &request(&repo, &out.path().join("doc.md"), true),
        &config,
        &counting_generator(calls.clone()),
        &TemplateEngine::bundled().unwrap(),
        &FileSink,
    )
    .await
    .unwrap();
    assert!(!report.deployment_included);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn failing_section_stops_the_run_before_persisting() {
    let repo = sample_repo(&[]);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut generator = MockGenerator::new();
    generator.expect_generate().returning(move |task| {
        counter.fetch_add(1, Ordering::SeqCst);
        if task.role == AgentRole::TechnicalWriter && task.expected_output.contains("architecture") {
            Err("model overloaded".into())
        } else {
            Ok("text".to_string())
        }
    });
    let mut sink = MockDocumentSink::new();
    sink.expect_persist().never();

    let err = generate_documentation(
        &request(&repo, std::path::Path::new("unused.md"), false),
        &PipelineConfig::default(),
        &generator,
        &TemplateEngine::bundled().unwrap(),
        &sink,
    )
    .await
    .unwrap_err();

    assert_eq!(err.class(), ErrorClass::ExternalServiceFailure);
    assert!(err.to_string().contains("architecture"), "got: {err}");
    // two snapshot calls, overview, then the failing architecture section
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn template_failure_is_reported_as_template_error() {
    let repo = sample_repo(&[]);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut renderer = MockTemplateRenderer::new();
    renderer
        .expect_render()
        .returning(|name, _| Err(format!("template '{name}' not found").into()));
    let mut sink = MockDocumentSink::new();
    sink.expect_persist().never();

    let err = generate_documentation(
        &request(&repo, std::path::Path::new("unused.md"), false),
        &PipelineConfig::default(),
        &counting_generator(calls),
        &renderer,
        &sink,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("structure.md.j2"), "got: {err}");
}

#[tokio::test]
async fn sink_failure_is_a_persistence_error() {
    let repo = sample_repo(&[]);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sink = MockDocumentSink::new();
    sink.expect_persist()
        .times(1)
        .returning(|_, _| Err("disk full".into()));

    let err = generate_documentation(
        &request(&repo, std::path::Path::new("out.md"), false),
        &PipelineConfig::default(),
        &counting_generator(calls),
        &TemplateEngine::bundled().unwrap(),
        &sink,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("disk full"), "got: {err}");
}
