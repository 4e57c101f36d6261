mod filters;

use std::error::Error as StdError;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, Error as TemplateError, ErrorKind, path_loader};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::Config;
use crate::journal::JournalSource;

pub fn environment(config: &Config) -> Environment<'static> {
    let mut env = Environment::new();
    // Templates receive trusted input; html output is emitted verbatim.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_global("config", Value::from_serialize(config));
    env.add_global(
        "base_url",
        Value::from_safe_string(normalize_base_url(&config.base_url)),
    );

    env.add_function(
        "now",
        |format: Option<String>| -> Result<String, TemplateError> {
            let format = format.as_deref().unwrap_or(filters::DEFAULT_DATETIME_FORMAT);

            if format.eq_ignore_ascii_case("RFC3339") {
                return OffsetDateTime::now_utc().format(&Rfc3339).map_err(|err| {
                    TemplateError::new(
                        ErrorKind::InvalidOperation,
                        format!("failed to format now(): {err}"),
                    )
                });
            }

            let items = filters::translate_strftime(format)?;
            OffsetDateTime::now_utc().format(&items).map_err(|err| {
                TemplateError::new(
                    ErrorKind::InvalidOperation,
                    format!("failed to format now(): {err}"),
                )
            })
        },
    );

    filters::register(&mut env);

    env
}

/// Renders the template at `template_path` against the journal document.
/// A missing template is a no-op yielding an empty string; the journal
/// source is never consulted in that case.
pub fn render_document(
    template_path: &Path,
    config: &Config,
    source: &dyn JournalSource,
) -> Result<String> {
    if !template_path.exists() {
        return Ok(String::new());
    }

    let journal = source.fetch()?;

    let template_dir = match template_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let template_name = template_path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| {
            format!(
                "template path {} has no usable file name",
                template_path.display()
            )
        })?
        .to_string();

    let mut env = environment(config);
    env.set_loader(path_loader(template_dir));

    let template = env
        .get_template(&template_name)
        .map_err(|err| describe_template_error(&template_name, err))?;
    template
        .render(Value::from_serialize(&journal))
        .map_err(|err| describe_template_error(&template_name, err))
}

/// Unpacks a minijinja error into one diagnostic: template name, line,
/// error kind, message, and the nested cause when a filter failed.
fn describe_template_error(template_name: &str, err: TemplateError) -> anyhow::Error {
    let actual_template = err.name().unwrap_or(template_name).to_string();
    let line = err.line();
    let kind = err.kind();
    let detail = err.detail().map(str::to_string);
    let summary = err.to_string();
    let nested = StdError::source(&err).map(|source| source.to_string());

    let mut message = String::new();
    let _ = write!(&mut message, "template '{}'", actual_template);

    if actual_template != template_name {
        let _ = write!(&mut message, " (loaded from '{}')", template_name);
    }

    if let Some(line_no) = line {
        let _ = write!(&mut message, " at line {}", line_no);
    }

    let _ = write!(&mut message, "\nkind: {:?}", kind);
    let _ = write!(&mut message, "\nmessage: {}", detail.unwrap_or(summary));

    if let Some(source) = nested {
        let _ = write!(&mut message, "\ncaused by: {}", source);
    }

    anyhow!(message)
}

fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::{Map as JsonMap, Value as JsonValue, json};
    use std::fs;
    use tempfile::TempDir;

    struct StaticSource(JsonMap<String, JsonValue>);

    impl JournalSource for StaticSource {
        fn fetch(&self) -> Result<JsonMap<String, JsonValue>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl JournalSource for FailingSource {
        fn fetch(&self) -> Result<JsonMap<String, JsonValue>> {
            bail!("journal source must not be consulted");
        }
    }

    fn journal_with_entries() -> StaticSource {
        let document = json!({
            "tags": {"#rust": 2},
            "entries": [
                {
                    "title": "First entry",
                    "date": "2023-04-01 09:30",
                    "body": "Hello **world**",
                    "tags": ["#rust"]
                },
                {
                    "title": "Second entry",
                    "date": "2023-04-02 18:15",
                    "body": "More notes",
                    "tags": []
                }
            ]
        });
        match document {
            JsonValue::Object(map) => StaticSource(map),
            _ => unreachable!(),
        }
    }

    fn write_template(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn config_available_in_templates() {
        let mut env = environment(&Config::default());
        env.add_template("greet", "{{ config.title }}").unwrap();

        let rendered = env.get_template("greet").unwrap().render(()).unwrap();
        assert_eq!(rendered, "Ashley Robin's Journal");
    }

    #[test]
    fn extra_config_fields_are_exposed() {
        let mut config = Config::default();
        config.extra.insert(
            "accent".to_string(),
            JsonValue::String("mauve".to_string()),
        );

        let mut env = environment(&config);
        env.add_template("accent", "{{ config.accent }}").unwrap();

        let rendered = env.get_template("accent").unwrap().render(()).unwrap();
        assert_eq!(rendered, "mauve");
    }

    #[test]
    fn base_url_has_no_trailing_slash() {
        let mut config = Config::default();
        config.base_url = "https://example.com/journal/".to_string();
        let mut env = environment(&config);
        env.add_template("base", "{{ base_url }}").unwrap();

        let rendered = env.get_template("base").unwrap().render(()).unwrap();
        assert_eq!(rendered, "https://example.com/journal");
    }

    #[test]
    fn now_helper_accepts_rfc3339_keyword() {
        let mut env = environment(&Config::default());
        env.add_template("when", "{{ now('RFC3339') }}").unwrap();

        let rendered = env.get_template("when").unwrap().render(()).unwrap();
        assert!(rendered.contains('T'));
        assert!(rendered.ends_with('Z'));
    }

    #[test]
    fn now_helper_formats_with_strftime() {
        let mut env = environment(&Config::default());
        env.add_template("when", "{{ now('%Y') }}").unwrap();

        let rendered = env.get_template("when").unwrap().render(()).unwrap();
        assert_eq!(rendered.len(), 4);
        assert!(rendered.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn missing_template_yields_empty_output() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("absent.html");

        let rendered =
            render_document(&absent, &Config::default(), &FailingSource).unwrap();
        assert_eq!(rendered, "");
    }

    #[test]
    fn renders_journal_entries_with_filters() {
        let dir = TempDir::new().unwrap();
        let template = write_template(
            dir.path(),
            "journal.txt",
            "{% for entry in entries %}{{ entry.date | datetime('%Y/%m/%d', '+0000') }} \
{{ entry.title }}|{% endfor %}",
        );

        let rendered =
            render_document(&template, &Config::default(), &journal_with_entries()).unwrap();
        assert_eq!(rendered, "2023/04/01 First entry|2023/04/02 Second entry|");
    }

    #[test]
    fn sibling_templates_resolve_through_includes() {
        let dir = TempDir::new().unwrap();
        write_template(dir.path(), "header.txt", "== {{ config.title }} ==");
        let template = write_template(dir.path(), "page.txt", "{% include 'header.txt' %}\nbody");

        let rendered =
            render_document(&template, &Config::default(), &journal_with_entries()).unwrap();
        assert_eq!(rendered, "== Ashley Robin's Journal ==\nbody");
    }

    #[test]
    fn template_syntax_error_is_fatal() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path(), "broken.txt", "{% for %}");

        let error = render_document(&template, &Config::default(), &journal_with_entries())
            .unwrap_err();
        let message = format!("{error}");
        assert!(message.contains("broken.txt"), "{message}");
        assert!(message.contains("kind:"), "{message}");
    }

    #[test]
    fn filter_failure_carries_template_diagnostic() {
        let dir = TempDir::new().unwrap();
        let template = write_template(
            dir.path(),
            "bad_date.txt",
            "{{ 'April 1st' | datetime('%Y', '+0000') }}",
        );

        let error = render_document(&template, &Config::default(), &journal_with_entries())
            .unwrap_err();
        let message = format!("{error}");
        assert!(message.contains("bad_date.txt"), "{message}");
        assert!(message.contains("YYYY-MM-DD HH:MM"), "{message}");
    }

    #[test]
    fn journal_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let template = write_template(dir.path(), "page.txt", "{{ config.title }}");

        let error = render_document(&template, &Config::default(), &FailingSource).unwrap_err();
        assert!(format!("{error}").contains("journal source"));
    }
}
