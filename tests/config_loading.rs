// tests/config_loading.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use airflow_runner::config::{FileFormat, load_flow, load_settings_file, settings_path};
use airflow_runner::errors::RunnerError;
use airflow_runner::flow::{StepKind, preview};
use airflow_runner::fs::mock::MockFileSystem;
use airflow_runner::payload::PayloadRenderer;
use airflow_runner::types::FailurePolicy;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn jobs_per_step(path: &Path) -> Vec<Vec<String>> {
    load_flow(path)
        .unwrap()
        .steps()
        .iter()
        .map(|s| s.jobs().to_vec())
        .collect()
}

#[test]
fn yaml_toml_and_json_flows_load_the_same_plan() {
    let dir = TempDir::new().unwrap();
    let yaml = write(
        &dir,
        "flow.yaml",
        "jobs:\n  - step: [extract]\n  - step: [price_fx, price_rates]\n",
    );
    let toml = write(
        &dir,
        "flow.toml",
        "[[jobs]]\nstep = [\"extract\"]\n\n[[jobs]]\nstep = [\"price_fx\", \"price_rates\"]\n",
    );
    let json = write(
        &dir,
        "flow.json",
        r#"{"jobs": [{"step": ["extract"]}, {"step": ["price_fx", "price_rates"]}]}"#,
    );

    let expected = vec![
        vec!["extract".to_string()],
        vec!["price_fx".to_string(), "price_rates".to_string()],
    ];
    assert_eq!(jobs_per_step(&yaml), expected);
    assert_eq!(jobs_per_step(&toml), expected);
    assert_eq!(jobs_per_step(&json), expected);
}

#[test]
fn capitalised_keys_are_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "legacy.yml", "Jobs:\n  - Step: [a]\n  - Step: [b, c]\n");

    let plan = load_flow(&path).unwrap();
    let kinds: Vec<_> = plan.steps().iter().map(StepKind::from).collect();

    assert_eq!(kinds[0], StepKind::Serial("a"));
    assert!(matches!(kinds[1], StepKind::Parallel(jobs) if jobs.len() == 2));
    assert_eq!(kinds[1].job_count(), 2);
}

#[test]
fn flow_without_steps_is_valid_and_empty() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "empty.yaml", "jobs: []\n");

    assert!(load_flow(&path).unwrap().is_empty());
}

#[test]
fn invalid_flows_are_config_errors() {
    let dir = TempDir::new().unwrap();
    let cases = [
        ("empty_step.yaml", "jobs:\n  - step: []\n"),
        ("duplicate.yaml", "jobs:\n  - step: [a, b, a]\n"),
        ("blank.yaml", "jobs:\n  - step: [\"  \"]\n"),
        ("slash.yaml", "jobs:\n  - step: [\"a/b\"]\n"),
    ];

    for (name, contents) in cases {
        let path = write(&dir, name, contents);
        let err = load_flow(&path).unwrap_err();
        assert!(matches!(err, RunnerError::ConfigError(_)), "{name}: {err:?}");
    }
}

#[test]
fn same_job_in_different_steps_is_allowed() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "repeat.yaml", "jobs:\n  - step: [a]\n  - step: [a, b]\n");

    assert_eq!(load_flow(&path).unwrap().steps().len(), 2);
}

#[test]
fn unsupported_extension_and_syntax_errors_are_reported() {
    let dir = TempDir::new().unwrap();

    let ini = write(&dir, "flow.ini", "jobs = a");
    assert!(matches!(load_flow(&ini), Err(RunnerError::ConfigError(_))));
    assert!(FileFormat::from_path(&ini).is_err());

    let broken = write(&dir, "broken.yaml", "jobs: [\n");
    assert!(matches!(load_flow(&broken), Err(RunnerError::YamlError(_))));

    let missing = dir.path().join("missing.yaml");
    assert!(matches!(load_flow(&missing), Err(RunnerError::IoError(_))));
}

#[test]
fn settings_file_is_read_when_given() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "settings.yaml",
        "host: airflow.internal:8080\nenv: prod\nuname: airflow\npass: secret\non_failure: abort\npoll_interval_secs: 30\n",
    );

    let resolved = settings_path(Some(path.as_path()));
    assert_eq!(resolved.as_deref(), Some(path.as_path()));

    let file = load_settings_file(resolved.as_deref()).unwrap();
    assert_eq!(file.host.as_deref(), Some("airflow.internal:8080"));
    assert_eq!(file.env.as_deref(), Some("prod"));
    assert_eq!(file.on_failure, Some(FailurePolicy::Abort));
    assert_eq!(file.poll_interval_secs, Some(30));
    assert_eq!(file.date, None);
}

#[test]
fn missing_settings_file_is_fine_only_when_implicit() {
    assert!(load_settings_file(None).unwrap().host.is_none());

    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(load_settings_file(Some(missing.as_path())).is_err());
}

#[test]
fn preview_renders_every_job_in_execution_order() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flow.yaml", "jobs:\n  - step: [a]\n  - step: [b, c]\n");
    let plan = load_flow(&path).unwrap();

    let fs = MockFileSystem::new();
    fs.add_file("tpl/c.json", r#"{"date": "{{ EodDate }}"}"#);
    let renderer = PayloadRenderer::new(Arc::new(fs), "tpl");

    let planned = preview(&plan, "2022-01-01,2022-01-02", &renderer, "dev").unwrap();

    let order: Vec<_> = planned
        .iter()
        .map(|p| (p.date.as_str(), p.step, p.job.as_str(), p.parallel))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2022-01-01", 0, "a", false),
            ("2022-01-01", 1, "b", true),
            ("2022-01-01", 1, "c", true),
            ("2022-01-02", 0, "a", false),
            ("2022-01-02", 1, "b", true),
            ("2022-01-02", 1, "c", true),
        ]
    );
    assert_eq!(planned[2].payload.as_deref(), Some(r#"{"date": "2022-01-01"}"#));
    assert_eq!(planned[4].payload, None);
}
