//! docshift CLI
//!
//! Copies document collections between MongoDB databases.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use docshift::config::CONFIG_TEMPLATE;
use docshift::{MongoStore, ReplicationConfig, ReplicationReport, Replicator};

#[derive(Parser)]
#[command(name = "docshift")]
#[command(version)]
#[command(about = "Copy document collections between databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replicate the collections listed in a config file
    Run {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Read and transform without writing to the destination
        #[arg(long)]
        dry_run: bool,

        /// Count duplicate documents and keep going
        #[arg(long)]
        ignore_duplicates: bool,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "replication.yaml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report.
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            config,
            dry_run,
            ignore_duplicates,
        } => run_replication(&config, dry_run, ignore_duplicates).await,
        Commands::Validate { config } => validate_config(&config),
        Commands::Init { output } => generate_config(&output),
    }
}

async fn run_replication(
    config_path: &Path,
    dry_run: bool,
    ignore_duplicates: bool,
) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let mut config = ReplicationConfig::from_file(config_path)?;
    if dry_run {
        config.options.dry_run = true;
    }
    if ignore_duplicates {
        config.options.ignore_duplicates = true;
    }
    config.validate()?;
    let plan = config.to_plan()?;

    let (source, destination) = tokio::try_join!(
        MongoStore::connect(config.source.connection_ref()),
        MongoStore::connect(config.destination.connection_ref()),
    )?;

    let replicator = Replicator::new(Arc::new(source), Arc::new(destination), plan, config.options);
    match replicator.run().await {
        Ok(report) => {
            print_report(&report)?;
            Ok(())
        }
        Err(failure) => {
            let (report, error) = failure.into_parts();
            print_report(&report)?;
            Err(error.into())
        }
    }
}

fn print_report(report: &ReplicationReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = ReplicationConfig::from_file(config_path)?;
    config.validate()?;

    println!("Configuration is valid!");
    println!(
        "   Source:      {}",
        config.source.database.as_deref().unwrap_or("<uri default>")
    );
    println!(
        "   Destination: {}",
        config.destination.database.as_deref().unwrap_or("<uri default>")
    );
    println!("   Collections:");
    for (name, collection) in &config.collections {
        let transform = if collection.transform.is_some() {
            " (transformed)"
        } else {
            ""
        };
        println!("     - {}{}", name, transform);
    }

    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!("Generated configuration: {:?}", output);
    println!("   Edit the file and run: docshift run --config {:?}", output);

    Ok(())
}
