//! sortbin - Photograph a piece of waste, learn which bin it goes in.
//!
//! Serves a single-page web app: upload a photo, it is hosted on imgbb,
//! classified by CLIP against a recycling taxonomy, and the ranked category
//! scores are shown next to the image.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the CLIP model once
//! sortbin models download
//!
//! # Start the web app (reads IMGBB_API_KEY, optional PORT)
//! IMGBB_API_KEY=... sortbin serve
//!
//! # Inspect the taxonomy the classifier uses
//! sortbin taxonomy
//! ```

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sortbin_core::config::PORT_ENV;
use sortbin_core::Config;

mod cli;
mod logging;
mod web;

/// sortbin - zero-shot recycling classifier web app.
#[derive(Parser, Debug)]
#[command(name = "sortbin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web app (default)
    Serve(cli::serve::ServeArgs),

    /// Print the recycling taxonomy and its descriptors
    Taxonomy(cli::taxonomy::TaxonomyArgs),

    /// Manage the CLIP model files (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(
        &Config::default_path(),
        std::env::var(PORT_ENV).ok().as_deref(),
    )?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("sortbin v{}", sortbin_core::VERSION);

    match cli.command {
        Some(Commands::Serve(args)) => cli::serve::execute(args, config).await,
        None => cli::serve::execute(cli::serve::ServeArgs::default(), config).await,
        Some(Commands::Taxonomy(args)) => cli::taxonomy::execute(args, &config),
        Some(Commands::Models(args)) => cli::models::execute(args, &config).await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
    }
}

/// Load the config file, falling back to defaults if it is unreadable, then
/// apply `PORT`.
///
/// A malformed `PORT` is a startup error: it must never replace the file
/// configuration with defaults.
fn load_config(path: &Path, port: Option<&str>) -> anyhow::Result<Config> {
    // Logging isn't initialized yet, so config warnings go through eprintln.
    let mut config = match Config::load_or_default(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sortbin config path`."
            );
            Config::default()
        }
    };
    config
        .apply_port_override(port)
        .with_context(|| format!("invalid {PORT_ENV} environment variable"))?;
    Ok(config)
}
