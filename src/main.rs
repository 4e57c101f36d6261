mod cli;
mod commands;
mod config;
mod journal;
mod markdown;
mod output;
mod template;

fn main() {
    let app = cli::Cli::build();
    let outcome = commands::run(app);

    if let Err(problem) = outcome {
        eprintln!("{problem:?}");
        std::process::exit(1);
    }
}
