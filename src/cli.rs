use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "jrnlsite", version)]
#[command(
    about = "Render a jrnl journal as a static page",
    long_about = "jrnlsite pipes the entries of a jrnl-compatible journal through a minijinja\n\
template and writes the result to a single output file. Entries are fetched from\n\
the external journal tool as JSON, merged with a configuration object, and exposed\n\
to the template together with a small set of text filters."
)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "Template file to use to build the output",
        long_help = "Path to the minijinja template that produces the output document. Sibling files\nin the same directory are available to {% include %} and {% extends %}."
    )]
    pub template: PathBuf,
    #[arg(
        short,
        long,
        help = "Output file to write to",
        long_help = "Destination path for the rendered document. Missing parent directories are\ncreated; an existing file is overwritten."
    )]
    pub output: PathBuf,
    #[arg(
        short = 'x',
        long,
        default_value_t = -1,
        allow_hyphen_values = true,
        help = "Maximum number of journal items to render",
        long_help = "Exposed to templates as config.cutoff. Overrides any cutoff value from the\nconfiguration file; -1 leaves the item count unlimited."
    )]
    pub cutoff: i64,
    #[arg(
        short,
        long,
        help = "JSON configuration file for building your journal",
        long_help = "Path to a JSON configuration file. When omitted, the built-in defaults are\nused instead."
    )]
    pub config: Option<PathBuf>,
    #[arg(
        short,
        long,
        help = "Print progress information while rendering",
        long_help = "Show which pipeline stages run: configuration, journal fetch, render, write."
    )]
    pub verbose: bool,
}

impl Cli {
    pub fn build() -> Self {
        <Self as Parser>::parse()
    }
}
