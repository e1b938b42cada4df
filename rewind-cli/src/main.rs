mod cli;
mod commands;
mod output;
mod scripted;
mod simulated;

use crate::{
    cli::{Args, Commands, OutputFormat},
    commands::CommandExecutor,
};
use anyhow::Result;
use clap::Parser;
use std::{process, time::Duration};
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let output = args.output;
    let result = run(args).await;

    if let Err(e) = result {
        match output {
            OutputFormat::Json => {
                let error_json = serde_json::json!({
                    "status": "error",
                    "message": format!("{e:#}"),
                });
                println!("{error_json}");
            }
            OutputFormat::Pretty => {
                error!("Application error: {:#}", e);
                eprintln!("Error: {e:#}");
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let executor = CommandExecutor::new(
        Duration::from_secs(args.timeout),
        args.instance.as_deref(),
        args.output,
    );

    match args.command {
        Commands::Ladder { url, preferred } => {
            executor.ladder(&url, preferred.as_deref()).await?;
        }
        Commands::Skips {
            title,
            episode,
            catalog_id,
        } => {
            executor.skips(&title, &episode, catalog_id).await?;
        }
        Commands::Vote { skip_id, vote } => {
            executor.vote(&skip_id, vote.into()).await?;
        }
        Commands::Simulate(simulate) => {
            executor.simulate(simulate).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .init();
}
