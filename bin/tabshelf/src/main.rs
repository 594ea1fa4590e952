mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tabshelf")]
#[command(about = "Shelve open tabs into named groups and bring them back later", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.tabshelf/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show config and store paths with group/tab counts
    Status,

    /// Print the reconciled group list
    Groups {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run one message through the dispatcher and print the reply
    Request {
        /// Message JSON (e.g. '{"type":"addGroup","name":"Reading"}')
        message: String,
    },

    /// Serve JSON-lines messages on stdin/stdout
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries protocol output in `serve`; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Status => {
            commands::status::run(cli.config.as_deref()).await?;
        }
        Commands::Groups { json } => {
            commands::groups::run(cli.config.as_deref(), json).await?;
        }
        Commands::Request { message } => {
            commands::request::run(cli.config.as_deref(), &message).await?;
        }
        Commands::Serve => {
            commands::serve::run(cli.config.as_deref()).await?;
        }
    }

    Ok(())
}
