use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Drops every line that is empty or whitespace-only, keeping the remaining
/// lines and their original line endings in order. Templates relying on
/// intentional blank lines lose them here.
pub fn strip_blank_lines(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Writes the rendered document, creating missing parent directories and
/// overwriting any previous file at the path.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
