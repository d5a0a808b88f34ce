//! mediaslot CLI - manage generated media for a brochure site

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{audit, generate, resolve, select, serve, slots};
use mediaslot_media::{MediaConfig, MediaKind, MediaService, RuntimeMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaslot")]
#[command(about = "Slot manifests and versioned media for a brochure site", long_about = None)]
#[command(version)]
struct Cli {
    /// Media kind to operate on (image or video)
    #[arg(long, short, global = true, default_value = "image")]
    kind: MediaKind,

    /// Override the configured runtime mode (development or production)
    #[arg(long, global = true)]
    mode: Option<RuntimeMode>,

    /// Config file to use instead of the layered lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log generator output and request details
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List slots with their selection state
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one slot and its candidates
    Show {
        /// Slot id (e.g. "why-us", "services/hero")
        slot: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select a candidate and promote it into the stable directory
    Select {
        slot: String,
        filename: String,
    },

    /// Delete a candidate from the manifest and disk
    Delete {
        slot: String,
        filename: String,
    },

    /// Re-promote every selected slot
    Promote,

    /// Generate new candidates for a slot
    Generate {
        slot: String,

        /// Prompt (defaults to the slot's stored prompt)
        #[arg(long, short)]
        prompt: Option<String>,

        /// Number of candidates
        #[arg(long, short = 'n')]
        count: Option<u32>,

        /// Aspect ratio, e.g. 4:3
        #[arg(long)]
        aspect: Option<String>,

        /// Clip length in seconds (video only)
        #[arg(long)]
        duration: Option<u32>,

        /// Generator to use instead of the configured one (command, mock)
        #[arg(long)]
        generator: Option<String>,

        /// Generate into the next free version of the slot (e.g. hero-v3)
        #[arg(long)]
        next_version: bool,

        /// Print the generator invocation without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the path a slot family renders from
    Resolve {
        /// Base slot name (versions like hero-v2 are found automatically)
        slot: String,

        /// Path used when nothing in the family is promoted
        #[arg(long, default_value = "")]
        default: String,

        /// Preview this candidate of the slot instead (development only)
        #[arg(long)]
        candidate: Option<String>,
    },

    /// Add configured slots that are missing from the manifest
    Seed,

    /// Check selected and promoted files against each other
    Audit {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the development media API over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:4321")]
        addr: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>, mode: Option<RuntimeMode>) -> Result<MediaConfig> {
    let mut config = match path {
        Some(path) => MediaConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MediaConfig::load().context("loading config")?,
    };
    if let Some(mode) = mode {
        config.mode = mode;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref(), cli.mode)?;
    tracing::debug!(mode = %config.mode, "configuration loaded");
    let service = MediaService::from_config(&config);
    let kind = cli.kind;

    match cli.command {
        Commands::List { json } => slots::list(&service, kind, json),
        Commands::Show { slot, json } => slots::show(&service, kind, &slot, json),
        Commands::Select { slot, filename } => select::select(&service, kind, &slot, &filename),
        Commands::Delete { slot, filename } => select::delete(&service, kind, &slot, &filename),
        Commands::Promote => select::promote(&service, kind),
        Commands::Generate {
            slot,
            prompt,
            count,
            aspect,
            duration,
            generator,
            next_version,
            dry_run,
        } => generate::run(
            &service,
            generate::GenerateArgs {
                kind,
                slot,
                prompt,
                count,
                aspect,
                duration,
                generator,
                next_version,
                dry_run,
            },
        ),
        Commands::Resolve {
            slot,
            default,
            candidate,
        } => resolve::run(&config, kind, &slot, &default, candidate.as_deref()),
        Commands::Seed => generate::seed(&service, kind),
        Commands::Audit { json } => audit::run(&service, kind, json),
        Commands::Serve { addr } => serve::run(&service, &addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mediaslot", "generate", "hero", "-n", "2", "--duration", "6", "--kind", "videos",
            "--mode", "dev",
        ])
        .unwrap();
        assert_eq!(cli.kind, MediaKind::Video);
        assert_eq!(cli.mode, Some(RuntimeMode::Development));
        match cli.command {
            Commands::Generate {
                slot,
                count,
                duration,
                prompt,
                ..
            } => {
                assert_eq!(slot, "hero");
                assert_eq!(count, Some(2));
                assert_eq!(duration, Some(6));
                assert!(prompt.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mediaslot", "resolve", "hero"]).unwrap();
        assert_eq!(cli.kind, MediaKind::Image);
        assert!(cli.mode.is_none());
        assert!(matches!(
            cli.command,
            Commands::Resolve { ref default, candidate: None, .. } if default.is_empty()
        ));
        assert!(Cli::try_parse_from(["mediaslot", "--kind", "audio", "list"]).is_err());
    }
}
