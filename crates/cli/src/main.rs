//! DDU root-cause analysis CLI
//!
//! A command-line tool for validating activation configs, listing open DDU
//! problems and running the analysis on demand.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, check, problems};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DDU root-cause analysis CLI
#[derive(Parser)]
#[command(name = "ddu")]
#[command(author, version, about = "CLI for DDU spike root-cause analysis", long_about = None)]
pub struct Cli {
    /// Activation config path (defaults to ~/.config/ddu/activation.json)
    #[arg(long, short, env = "DDU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the activation config
    Check {
        /// Also verify each endpoint is reachable with its token
        #[arg(long)]
        connect: bool,
    },

    /// List open DDU problems
    Problems {
        /// Only this endpoint index
        #[arg(long, short)]
        endpoint: Option<usize>,
    },

    /// Explain open DDU problems
    Analyze {
        /// Only this endpoint index
        #[arg(long, short)]
        endpoint: Option<usize>,

        /// Comment unanalyzed problems instead of only printing the report
        #[arg(long)]
        post: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    let path = config::activation_path(cli.config)?;

    let result = match cli.command {
        Commands::Check { connect } => check::check_config(&path, connect, cli.format).await,
        Commands::Problems { endpoint } => {
            problems::list_problems(&path, endpoint, cli.format).await
        }
        Commands::Analyze { endpoint, post } => {
            analyze::analyze_problems(&path, endpoint, post, cli.format).await
        }
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
