mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `RUST_LOG` wins, then `-v`, then the configured level.
fn init_tracing(verbosity: u8, configured: Option<&str>) {
    let filter = match verbosity {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands must work even when the config is broken
        Command::Config(args) => {
            init_tracing(cli.global.verbose, None);
            commands::config_cmd::handle(args, &cli.global)
        }

        cmd => {
            let settings = commands::load_settings(&cli.global)?;
            init_tracing(cli.global.verbose, settings.log_level.as_deref());
            let coordinator = commands::connect(&settings).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &coordinator, &cli.global).await
        }
    }
}
