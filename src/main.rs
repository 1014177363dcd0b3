//! CLI entry point for extramile

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "extramile")]
#[command(version)]
#[command(about = "Serve a small business website with a Markdown blog", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
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
    /// Start the web server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// List site information
    List {
        /// Type of content to list (post, category, page)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Check that every post and page has a Markdown source
    Check,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "extramile=debug,tower_http=debug,info"
    } else {
        "extramile=info"
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
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Server { port, ip } => {
            let site = extramile::Site::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            site.serve(&ip, port).await?;
        }

        Commands::List { r#type } => {
            let site = extramile::Site::new(&base_dir)?;
            extramile::commands::list::run(&site, &r#type)?;
        }

        Commands::Check => {
            let site = extramile::Site::new(&base_dir)?;
            let report = site.check()?;
            report.print();
            if !report.is_ok() {
                anyhow::bail!("{} problem(s) found", report.problems.len());
            }
        }

        Commands::Version => {
            println!("extramile version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
