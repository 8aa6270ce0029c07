//! CLI entry point for folio-rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_rs::Folio;

#[derive(Parser)]
#[command(name = "folio-rs")]
#[command(author = "Yukang Chen")]
#[command(version = "0.1.0")]
#[command(about = "Content catalog pipeline for a Markdown/MDX blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the snapshot, compiled posts and feed
    #[command(alias = "b")]
    Build,

    /// List site information
    List {
        /// Type of content to list (post, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print the RSS feed
    Feed,

    /// Start the HTTP server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,
    },

    /// Remove build artifacts
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio_rs=debug,info"
    } else {
        "folio_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::Build => {
            let folio = Folio::new(&base_dir)?;
            tracing::info!("Building {:?}...", folio.output_dir);
            let report = folio.build()?;
            println!(
                "Built {} posts: {}, {}, {}",
                report.posts,
                report.snapshot.display(),
                report.compiled_dir.display(),
                report.feed.display()
            );
        }

        Commands::List { r#type } => {
            let folio = Folio::new(&base_dir)?;
            folio_rs::commands::list::run(&folio, &r#type)?;
        }

        Commands::Feed => {
            let folio = Folio::new(&base_dir)?;
            folio_rs::commands::feed::run(&folio)?;
        }

        Commands::Serve { port, ip } => {
            let folio = Folio::new(&base_dir)?;
            tracing::info!(
                "Starting server at http://{}:{} ({:?})",
                ip,
                port,
                folio.config.strategy
            );
            folio_rs::server::start(&folio, &ip, port).await?;
        }

        Commands::New { title } => {
            let folio = Folio::new(&base_dir)?;
            let path = folio.new_post(&title)?;
            println!("Created: {}", path.display());
        }

        Commands::Clean => {
            let folio = Folio::new(&base_dir)?;
            tracing::info!("Cleaning output folder...");
            folio.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("folio-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
