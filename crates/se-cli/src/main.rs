use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use se_cli::commands::{apply, edit};
use se_cli::{Cli, Commands, Config};

/// Initialize tracing, writing to `log_file` when one is given.
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        let _ = builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    let overwrite = cli.overwrite || config.overwrite;
    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    init_tracing(cli.verbose, log_file)?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Apply { input, output }) => {
            let summary = apply::run(input, output, overwrite).inspect_err(|e| {
                tracing::error!(error = %format!("{e:#}"), "apply failed");
            })?;
            tracing::info!(sources = summary.sources, "rule document applied");
            println!(
                "New file [{}] created with {} entries.",
                output.display(),
                summary.entries
            );
        }
        Some(Commands::Edit {
            input,
            output,
            action,
        }) => {
            let outcomes = edit::run(input, output, action, overwrite).inspect_err(|e| {
                tracing::error!(error = %format!("{e:#}"), "edit failed");
            })?;
            let mut written = 0;
            let mut affected = 0;
            for outcome in &outcomes {
                affected += outcome.affected;
                match outcome.written {
                    Some(entries) => {
                        written += 1;
                        println!(
                            "New file [{}] created with {entries} entries.",
                            outcome.output.display()
                        );
                    }
                    None => println!("Skipped [{}]: file exists.", outcome.output.display()),
                }
            }
            println!(
                "Edited {written} of {} files ({affected} changes).",
                outcomes.len()
            );
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
