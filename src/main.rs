//! CLI entry point for postmatter

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postmatter::commands::check::{CheckOptions, OutputFormat};

#[derive(Parser)]
#[command(name = "postmatter")]
#[command(version)]
#[command(about = "Parse and validate blog post front-matter", long_about = None)]
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
    /// Validate posts
    #[command(alias = "c")]
    Check {
        /// Files, directories, or glob patterns (defaults to the source directory)
        paths: Vec<String>,

        /// Fail on warnings too
        #[arg(short, long)]
        strict: bool,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Check again whenever a post changes
        #[arg(short, long)]
        watch: bool,
    },

    /// List posts, tags, or categories
    List {
        /// Type of content to list (post, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print a parsed post as JSON
    Show {
        /// Post file
        file: PathBuf,
    },

    /// Create a new post
    New {
        /// Layout to use (post, draft, or any scaffold name)
        #[arg(short, long)]
        layout: Option<String>,

        /// Title of the new post
        title: String,

        /// File name (without extension) for the new post
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postmatter=debug,info"
    } else {
        "postmatter=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Check {
            paths,
            strict,
            format,
            watch,
        } => {
            let site = postmatter::Site::new(&base_dir)?;
            let options = CheckOptions { strict, format };

            if watch {
                postmatter::commands::check::run(&site, &paths, &options)?;
                postmatter::commands::check::watch(&site, &paths, &options)?;
            } else {
                let summary = postmatter::commands::check::run(&site, &paths, &options)?;
                if !summary.passed() {
                    std::process::exit(1);
                }
            }
        }

        Commands::List { r#type } => {
            let site = postmatter::Site::new(&base_dir)?;
            postmatter::commands::list::run(&site, &r#type)?;
        }

        Commands::Show { file } => {
            let site = postmatter::Site::new(&base_dir)?;
            postmatter::commands::show::run(&site, &file)?;
        }

        Commands::New {
            layout,
            title,
            path,
        } => {
            let site = postmatter::Site::new(&base_dir)?;
            postmatter::commands::new::run(&site, &title, layout.as_deref(), path.as_deref())?;
        }

        Commands::Version => {
            println!("postmatter version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
