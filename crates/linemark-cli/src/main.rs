//! linemark CLI - file state, history and blame from your version control.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{Cli, Commands};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "LINEMARK_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Status { path, json } => commands::status::run(config, path, json).await,
        Commands::Show {
            file,
            rev,
            encoding,
        } => commands::show::run(config, &file, &rev, encoding.as_deref()).await,
        Commands::Blame { file, line, json } => {
            commands::blame::run(config, &file, line, json).await
        }
        Commands::Moved { file } => commands::moved::run(config, &file).await,
        Commands::Body { file, commit } => commands::body::run(config, &file, &commit).await,
        Commands::Version => commands::version::run(config).await,
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
