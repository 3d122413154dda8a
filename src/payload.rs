// src/payload.rs

//! Per-job request payloads.
//!
//! A payload is rendered from `<templates_dir>/<job>.json`, falling back to
//! `<templates_dir>/default_data.json`. If neither exists the job is
//! triggered without a body. Templates see two variables, `EodDate` and
//! `Env`, written either as `{{ EodDate }}` or in the older `{{.EodDate}}`
//! form.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::errors::{Result, RunnerError};
use crate::fs::FileSystem;

pub const DEFAULT_TEMPLATE: &str = "default_data.json";

static DOTTED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(-?)\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*(-?)\}\}")
        .expect("dotted reference pattern is valid")
});

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("expression pattern is valid"));

/// Variables available to a payload template for one (job, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobVariables {
    #[serde(rename = "EodDate")]
    pub eod_date: String,
    #[serde(rename = "Env")]
    pub env: String,
}

impl JobVariables {
    pub fn new(eod_date: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            eod_date: eod_date.into(),
            env: env.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PayloadRenderer {
    fs: Arc<dyn FileSystem>,
    templates_dir: PathBuf,
}

impl PayloadRenderer {
    pub fn new(fs: Arc<dyn FileSystem>, templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            templates_dir: templates_dir.into(),
        }
    }

    /// Render the payload for `job`.
    ///
    /// Returns `Ok(None)` when no template applies. A template that exists
    /// but cannot be read, rendered, or does not produce JSON is a
    /// `TemplateError`.
    pub fn render(&self, job: &str, vars: &JobVariables) -> Result<Option<String>> {
        let Some(path) = self.template_for(job) else {
            debug!(job, "no payload template; triggering with empty body");
            return Ok(None);
        };

        let source = self.fs.read_to_string(&path).map_err(|e| {
            RunnerError::TemplateError(format!("{}: {e:#}", path.display()))
        })?;
        let rendered = render_template(&source, vars)
            .map_err(|e| RunnerError::TemplateError(format!("{}: {e}", path.display())))?;

        debug!(job, template = %path.display(), "rendered payload");
        Ok(Some(rendered))
    }

    fn template_for(&self, job: &str) -> Option<PathBuf> {
        let own = self.templates_dir.join(format!("{job}.json"));
        if self.fs.is_file(&own) {
            return Some(own);
        }
        let fallback = self.templates_dir.join(DEFAULT_TEMPLATE);
        self.fs.is_file(&fallback).then_some(fallback)
    }
}

/// Render template text with `vars` and check the result is JSON.
pub fn render_template(source: &str, vars: &JobVariables) -> std::result::Result<String, String> {
    let source = DOTTED_REFERENCE.replace_all(source, "{{${1} ${2} ${3}}}");
    let source = protect_literal_text(&source);
    let context = Context::from_serialize(vars).map_err(|e| error_chain(&e))?;
    let rendered = Tera::one_off(&source, &context, false).map_err(|e| error_chain(&e))?;

    serde_json::from_str::<serde_json::Value>(&rendered)
        .map_err(|e| format!("rendered payload is not valid JSON: {e}"))?;
    Ok(rendered)
}

/// Only `{{ }}` is special in payload templates. Literal text that happens to
/// contain a tera tag or comment opener is wrapped in a raw block.
fn protect_literal_text(source: &str) -> Cow<'_, str> {
    if !has_tag_opener(source) {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len() + 32);
    let mut last = 0;
    for expr in EXPRESSION.find_iter(source) {
        push_literal(&mut out, &source[last..expr.start()]);
        out.push_str(expr.as_str());
        last = expr.end();
    }
    push_literal(&mut out, &source[last..]);
    Cow::Owned(out)
}

fn has_tag_opener(text: &str) -> bool {
    text.contains("{%") || text.contains("{#")
}

fn push_literal(out: &mut String, text: &str) {
    if has_tag_opener(text) {
        out.push_str("{% raw %}");
        out.push_str(text);
        out.push_str("{% endraw %}");
    } else {
        out.push_str(text);
    }
}

// Tera keeps the useful part ("Variable `X` not found") in the source chain.
fn error_chain(err: &tera::Error) -> String {
    let mut msg = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> JobVariables {
        JobVariables::new("2022-01-03", "uat")
    }

    #[test]
    fn renders_both_reference_styles() {
        let out = render_template(r#"{"a": "{{.EodDate}}", "b": "{{ Env }}"}"#, &vars()).unwrap();
        assert_eq!(out, r#"{"a": "2022-01-03", "b": "uat"}"#);
    }

    #[test]
    fn whitespace_control_is_kept() {
        let out = render_template("{\"d\": \"{{- .EodDate -}}\"}", &vars()).unwrap();
        assert_eq!(out, r#"{"d": "2022-01-03"}"#);
    }

    #[test]
    fn unknown_variable_fails() {
        let err = render_template(r#"{"a": "{{ .Region }}"}"#, &vars()).unwrap_err();
        assert!(err.contains("Region"), "unexpected message: {err}");
    }

    #[test]
    fn tag_openers_in_literal_text_are_escaped() {
        assert_eq!(protect_literal_text(r#"{"a": "{{ Env }}"}"#), r#"{"a": "{{ Env }}"}"#);
        assert_eq!(
            protect_literal_text(r#"{"f": "{%H", "a": "{{ Env }}"}"#),
            r#"{% raw %}{"f": "{%H", "a": "{% endraw %}{{ Env }}"}"#
        );
    }

    #[test]
    fn non_json_output_fails() {
        let err = render_template("date={{ EodDate }}", &vars()).unwrap_err();
        assert!(err.contains("not valid JSON"));
    }
}
