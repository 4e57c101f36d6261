mod render;

use anyhow::Result;

use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    render::run_render_command(cli)
}
