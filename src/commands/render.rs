use std::path::Path;

use anyhow::Result;

use crate::cli::Cli;
use crate::config::Config;
use crate::journal::JournalCommand;
use crate::output::{strip_blank_lines, write_output};
use crate::template::render_document;

pub fn run_render_command(args: Cli) -> Result<()> {
    let config = load_configuration(args.config.as_deref(), args.cutoff)?;
    log_status(
        args.verbose,
        "CONFIG",
        match &args.config {
            Some(path) => format!("Loaded {}", path.display()),
            None => "Using built-in defaults".to_string(),
        },
    );

    let source = JournalCommand::new(&config.journal_command);
    log_status(
        args.verbose,
        "RENDER",
        format!("Rendering {}", args.template.display()),
    );
    let rendered = render_document(&args.template, &config, &source)?;

    let cleaned = strip_blank_lines(&rendered);
    write_output(&args.output, &cleaned)?;
    log_status(
        args.verbose,
        "DONE",
        format!("Wrote {}", args.output.display()),
    );

    Ok(())
}

fn load_configuration(path: Option<&Path>, cutoff: i64) -> Result<Config> {
    let mut config = Config::load(path)?;
    // The CLI value always wins, even at its -1 default.
    config.cutoff = cutoff;
    Ok(config)
}

fn log_status(enabled: bool, label: &str, message: impl AsRef<str>) {
    if enabled {
        println!("[{}] {}", label, message.as_ref());
    }
}
