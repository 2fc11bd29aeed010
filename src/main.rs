//! CLI entry point for plume

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plume::Site;

#[derive(Parser)]
#[command(name = "plume")]
#[command(version)]
#[command(
    about = "Compose blog pages from front-matter posts and a layout theme",
    long_about = None
)]
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
    /// Initialize a new site with the starter theme
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post
    New {
        /// Layout to use (defaults to `default_layout`)
        #[arg(short, long)]
        layout: Option<String>,

        /// Title of the new post
        title: String,
    },

    /// Generate the site
    #[command(aliases = ["g", "build"])]
    Generate {
        /// Regenerate on file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Remove the generated output
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, layout, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "plume=debug,info"
    } else {
        "plume=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            Site::init(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New { layout, title } => {
            let site = Site::new(&base_dir)?;
            let path = site.new_post(&title, layout.as_deref())?;
            println!("Created: {:?}", path);
        }

        Commands::Generate { watch } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Generating site...");

            let report = site.generate()?;
            println!("{}", report);

            if watch {
                plume::commands::generate::watch(&site)?;
            }
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            plume::commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("plume version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
