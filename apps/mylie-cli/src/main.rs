use anyhow::Context;
use clap::{Parser, Subcommand};
use mylie_buildinfo::{StampConfig, Stamper, clock, properties};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mylie-cli", about = "CLI tool for mylie build metadata")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp a version.properties file from a repository's git state
    Stamp {
        /// Destination file
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Project version (defaults to the config file, then this tool's version)
        #[arg(long)]
        version: Option<String>,
        /// Repository working tree to query
        #[arg(short, long)]
        repo: Option<PathBuf>,
        /// YAML stamp configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// chrono format for buildTimestamp
        #[arg(long)]
        format: Option<String>,
    },
    /// Print a persisted version.properties file
    Show {
        path: PathBuf,
        /// Print as JSON instead of properties
        #[arg(long)]
        json: bool,
    },
    /// Print the engine banner and this binary's build info
    Info {
        /// Print only the embedded version.properties, byte for byte
        #[arg(long)]
        raw: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Stamp {
            out,
            version,
            repo,
            config,
            format,
        } => {
            let mut cfg = match config {
                Some(path) => StampConfig::load(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => StampConfig::default(),
            };
            apply_overrides(&mut cfg, out, version, repo, format);

            let stamper = Stamper::from_config(&cfg, env!("CARGO_PKG_VERSION"));
            let descriptor = stamper
                .stamp(&cfg.git(), &clock::from_env(), &cfg.destination)
                .with_context(|| format!("writing {}", cfg.destination.display()))?;
            println!("{}", cfg.destination.display());
            tracing::debug!("stamped {}", descriptor.summary());
        }
        Commands::Show { path, json } => {
            print!("{}", show(&path, json)?);
        }
        Commands::Info { raw } => {
            if !raw {
                mylie_engine_info::log_banner();
                println!("mylie-cli {}", mylie_engine_info::summary());
            }
            print!("{}", info(raw)?);
        }
    }

    Ok(())
}

/// Command-line flags win over config file values.
fn apply_overrides(
    cfg: &mut StampConfig,
    out: Option<PathBuf>,
    version: Option<String>,
    repo: Option<PathBuf>,
    format: Option<String>,
) {
    if let Some(out) = out {
        cfg.destination = out;
    }
    if version.is_some() {
        cfg.version = version;
    }
    if let Some(repo) = repo {
        cfg.repo_dir = repo;
    }
    if let Some(format) = format {
        cfg.timestamp_format = format;
    }
}

fn show(path: &Path, json: bool) -> anyhow::Result<String> {
    let descriptor =
        properties::load(path).with_context(|| format!("reading {}", path.display()))?;
    if json {
        Ok(serde_json::to_string_pretty(&descriptor)? + "\n")
    } else {
        Ok(properties::render(&descriptor))
    }
}

/// Embedded build info; `raw` returns the stamped file untouched.
fn info(raw: bool) -> anyhow::Result<String> {
    if raw {
        return Ok(mylie_engine_info::VERSION_PROPERTIES.to_string());
    }
    let info =
        mylie_engine_info::build().map_err(|e| anyhow::anyhow!("embedded build info: {e}"))?;
    Ok(properties::render(info))
}
