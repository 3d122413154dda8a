// tests/payload_rendering.rs

use std::path::PathBuf;
use std::sync::Arc;

use airflow_runner::errors::RunnerError;
use airflow_runner::fs::mock::MockFileSystem;
use airflow_runner::payload::{JobVariables, PayloadRenderer};

fn renderer(fs: &MockFileSystem) -> PayloadRenderer {
    PayloadRenderer::new(Arc::new(fs.clone()), "templates")
}

fn vars() -> JobVariables {
    JobVariables::new("2022-01-03", "prod")
}

#[test]
fn job_template_wins_over_default() {
    let fs = MockFileSystem::new();
    fs.add_file("templates/load_trades.json", r#"{"conf": {"eod": "{{.EodDate}}"}}"#);
    fs.add_file("templates/default_data.json", r#"{"conf": {}}"#);

    let payload = renderer(&fs).render("load_trades", &vars()).unwrap();
    assert_eq!(payload.as_deref(), Some(r#"{"conf": {"eod": "2022-01-03"}}"#));
    assert_eq!(fs.reads(), vec![PathBuf::from("templates/load_trades.json")]);
}

#[test]
fn falls_back_to_default_template() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "templates/default_data.json",
        r#"{"conf": {"eod": "{{ EodDate }}", "env": "{{ Env }}"}}"#,
    );

    let payload = renderer(&fs).render("anything", &vars()).unwrap();
    assert_eq!(
        payload.as_deref(),
        Some(r#"{"conf": {"eod": "2022-01-03", "env": "prod"}}"#)
    );
}

#[test]
fn no_template_means_no_payload() {
    let fs = MockFileSystem::new();
    let payload = renderer(&fs).render("load_trades", &vars()).unwrap();
    assert_eq!(payload, None);
    assert!(fs.reads().is_empty());
}

#[test]
fn unresolved_variable_is_a_template_error() {
    let fs = MockFileSystem::new();
    fs.add_file("templates/load_trades.json", r#"{"region": "{{ .Region }}"}"#);

    match renderer(&fs).render("load_trades", &vars()) {
        Err(RunnerError::TemplateError(msg)) => {
            assert!(msg.contains("load_trades.json"), "message: {msg}");
        }
        other => panic!("expected TemplateError, got {other:?}"),
    }
}

#[test]
fn malformed_template_is_a_template_error() {
    let fs = MockFileSystem::new();
    fs.add_file("templates/default_data.json", r#"{"eod": "{{ EodDate "}"#);

    let err = renderer(&fs).render("load_trades", &vars()).unwrap_err();
    assert!(matches!(err, RunnerError::TemplateError(_)));
}

#[test]
fn rendered_text_must_be_json() {
    let fs = MockFileSystem::new();
    fs.add_file("templates/load_trades.json", "eod={{ EodDate }}");

    let err = renderer(&fs).render("load_trades", &vars()).unwrap_err();
    assert!(matches!(err, RunnerError::TemplateError(_)));
}

#[test]
fn percent_and_hash_braces_in_strings_are_literal() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "templates/load_trades.json",
        r#"{"fmt": "{%Y-%m-%d}", "note": "{#tag", "eod": "{{.EodDate}}", "env": "{{ Env }}"}"#,
    );

    let payload = renderer(&fs).render("load_trades", &vars()).unwrap();
    assert_eq!(
        payload.as_deref(),
        Some(r#"{"fmt": "{%Y-%m-%d}", "note": "{#tag", "eod": "2022-01-03", "env": "prod"}"#)
    );
}

#[test]
fn tag_opener_after_the_last_expression_is_literal() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "templates/default_data.json",
        r#"{"eod": "{{ EodDate }}", "pattern": "{#{%"}"#,
    );

    let payload = renderer(&fs).render("any", &vars()).unwrap();
    assert_eq!(payload.as_deref(), Some(r#"{"eod": "2022-01-03", "pattern": "{#{%"}"#));
}
