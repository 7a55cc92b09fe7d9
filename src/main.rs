use std::process;

use clap::Parser;
use git_chrono::Cli;

fn main() {
    // RUST_LOG controls verbosity, "warn" by default; logs go to stderr so
    // they stay out of the reports printed on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e}");

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        process::exit(1);
    }
}
