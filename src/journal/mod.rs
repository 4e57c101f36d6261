use std::process::Command;

use anyhow::{Context, Result, bail};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Something that can produce the journal as structured data. The renderer
/// only ever sees this trait, so it can be exercised without the external
/// journal tool installed.
pub trait JournalSource {
    fn fetch(&self) -> Result<JsonMap<String, JsonValue>>;
}

/// Production source: invokes the configured journal command with
/// `--format json` and parses its stdout. The invocation blocks until the
/// tool exits; no timeout is applied.
pub struct JournalCommand {
    command: String,
}

impl JournalCommand {
    pub fn new(command: impl Into<String>) -> Self {
        JournalCommand {
            command: command.into(),
        }
    }

    /// Splits the configured command line into program and leading
    /// arguments, so `journal_command` values like `jrnl work` select a
    /// named journal.
    fn parse_command(&self) -> Result<(String, Vec<String>)> {
        let mut parts = self.command.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            bail!("journal_command must not be empty");
        };
        Ok((program, parts.collect()))
    }
}

impl JournalSource for JournalCommand {
    fn fetch(&self) -> Result<JsonMap<String, JsonValue>> {
        let (program, args) = self.parse_command()?;
        let output = Command::new(&program)
            .args(&args)
            .args(["--format", "json"])
            .output()
            .with_context(|| format!("failed to run journal command '{}'", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "journal command '{}' failed ({}): {}",
                self.command,
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).with_context(|| {
            format!("journal command '{}' emitted non-UTF8 output", self.command)
        })?;
        let document: JsonValue = serde_json::from_str(&stdout).with_context(|| {
            format!("journal command '{}' did not emit valid JSON", self.command)
        })?;

        match document {
            JsonValue::Object(map) => Ok(map),
            _ => bail!(
                "journal command '{}' must emit a JSON object at the top level",
                self.command
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_simple() {
        let source = JournalCommand::new("jrnl");
        let (program, args) = source.parse_command().unwrap();
        assert_eq!(program, "jrnl");
        assert!(args.is_empty());
    }

    #[test]
    fn parse_command_with_arguments() {
        let source = JournalCommand::new("jrnl work");
        let (program, args) = source.parse_command().unwrap();
        assert_eq!(program, "jrnl");
        assert_eq!(args, vec!["work"]);
    }

    #[test]
    fn parse_command_collapses_whitespace() {
        let source = JournalCommand::new("  jrnl   --debug  ");
        let (program, args) = source.parse_command().unwrap();
        assert_eq!(program, "jrnl");
        assert_eq!(args, vec!["--debug"]);
    }

    #[test]
    fn parse_command_rejects_empty() {
        let source = JournalCommand::new("");
        assert!(source.parse_command().is_err());
    }

    #[test]
    fn fetch_reports_missing_program() {
        let source = JournalCommand::new("jrnlsite-no-such-binary");
        let error = source.fetch().unwrap_err();
        assert!(format!("{error}").contains("failed to run journal command"));
    }

    #[cfg(unix)]
    #[test]
    fn fetch_parses_command_output() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-jrnl");
        fs::write(
            &script,
            "#!/bin/sh\nprintf '{\"entries\": [{\"title\": \"First\"}]}'\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let source = JournalCommand::new(script.to_str().unwrap());
        let journal = source.fetch().unwrap();
        let entries = journal.get("entries").and_then(JsonValue::as_array).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn fetch_rejects_non_object_output() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-jrnl");
        fs::write(&script, "#!/bin/sh\nprintf '[1, 2, 3]'\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let source = JournalCommand::new(script.to_str().unwrap());
        let error = source.fetch().unwrap_err();
        assert!(format!("{error}").contains("JSON object"));
    }
}
