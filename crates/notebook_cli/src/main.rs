//! Notebook CLI
//!
//! Command-line client for shared notebooks.
//!
//! # Commands
//!
//! - `new` - Create a notebook and print its id
//! - `list` - Reconcile and show the notes of a notebook
//! - `add`, `edit`, `delete` - Change notes; changes are queued locally and
//!   sent when the service is reachable
//! - `sync` - Reconcile and send queued changes
//! - `status` - Show queued changes without contacting the service
//! - `share` - Print the text to share a notebook
//! - `serve` - Run the reference notes service

mod commands;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared notebook command-line client.
#[derive(Parser)]
#[command(name = "notebook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the local state of each notebook
    #[arg(global = true, long, default_value = ".notebooks")]
    state_dir: PathBuf,

    /// Base URL of the notes service
    #[arg(global = true, long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a notebook and print its id
    New,

    /// Show the notes of a notebook
    List {
        /// Notebook id
        notebook: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a note
    Add {
        /// Notebook id
        notebook: String,

        /// Note content
        content: String,
    },

    /// Replace the content of a note
    Edit {
        /// Notebook id
        notebook: String,

        /// Note id
        note: String,

        /// New content
        content: String,
    },

    /// Delete a note
    Delete {
        /// Notebook id
        notebook: String,

        /// Note id
        note: String,
    },

    /// Reconcile with the service and send queued changes
    Sync {
        /// Notebook id
        notebook: String,
    },

    /// Show queued changes without contacting the service
    Status {
        /// Notebook id
        notebook: String,
    },

    /// Print the text to share a notebook
    Share {
        /// Notebook id
        notebook: String,
    },

    /// Run the reference notes service
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ctx = commands::Context::new(cli.state_dir, cli.server);

    match cli.command {
        Commands::New => commands::sync::new(&ctx).await?,
        Commands::List { notebook, format } => {
            commands::notes::list(&ctx, &notebook, &format).await?;
        }
        Commands::Add { notebook, content } => {
            commands::notes::add(&ctx, &notebook, &content).await?;
        }
        Commands::Edit {
            notebook,
            note,
            content,
        } => {
            commands::notes::edit(&ctx, &notebook, &note, &content).await?;
        }
        Commands::Delete { notebook, note } => {
            commands::notes::delete(&ctx, &notebook, &note).await?;
        }
        Commands::Sync { notebook } => commands::sync::sync(&ctx, &notebook).await?,
        Commands::Status { notebook } => commands::sync::status(&ctx, &notebook)?,
        Commands::Share { notebook } => commands::sync::share(&ctx, &notebook)?,
        Commands::Serve { bind } => commands::serve::run(bind).await?,
    }

    Ok(())
}
