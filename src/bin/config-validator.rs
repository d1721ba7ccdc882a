//! # Setup Experience Configuration Validator
//!
//! Command-line tool for loading and validating setup experience configuration for
//! an environment before deploying it.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use setup_experience::config::{ConfigManager, SetupExperienceConfig};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate setup experience configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the full configuration
    All,

    /// Show one configuration section
    Component {
        /// setup_experience, release, logging or telemetry
        name: String,
    },

    /// Show sections that differ between two environments
    Compare {
        #[arg(short, long, default_value = "development")]
        base: String,

        #[arg(short, long)]
        target: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) | None => validate_all_config(&cli),
        Some(Commands::Component { name }) => show_component(&cli, name),
        Some(Commands::Compare { base, target }) => compare_configs(&cli, base, target),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("Configuration validation failed: {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli, environment: &str) -> Result<SetupExperienceConfig> {
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), environment)
        .with_context(|| format!("loading configuration for environment '{environment}'"))?;
    Ok(manager.config().clone())
}

fn validate_all_config(cli: &Cli) -> Result<()> {
    let config = load(cli, &cli.environment)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Table => print_table(&cli.environment, &config),
    }

    Ok(())
}

fn print_table(environment: &str, config: &SetupExperienceConfig) {
    println!("Setup experience configuration ({environment})");
    println!();
    println!(
        "  {:<40} {}",
        "setup_experience.stuck_step_warning_seconds",
        config.setup_experience.stuck_step_warning_seconds
    );
    println!(
        "  {:<40} {}",
        "release.manual_release_default", config.release.manual_release_default
    );

    let mut overrides: Vec<_> = config.release.team_overrides.iter().collect();
    overrides.sort();
    for (team, enabled) in overrides {
        println!(
            "  {:<40} {}",
            format!("release.team_overrides.{team}"),
            enabled
        );
    }

    println!(
        "  {:<40} {}",
        "logging.level",
        config.logging.level.as_deref().unwrap_or("(environment default)")
    );
    println!("  {:<40} {}", "logging.json", config.logging.json);
    println!(
        "  {:<40} {}",
        "telemetry.metrics_enabled", config.telemetry.metrics_enabled
    );
    println!(
        "  {:<40} {}",
        "telemetry.service_name", config.telemetry.service_name
    );
    println!();
    println!("Configuration is valid");
}

fn section(config: &SetupExperienceConfig, name: &str) -> Result<serde_json::Value> {
    let value = match name.to_lowercase().replace('-', "_").as_str() {
        "setup_experience" | "sequencing" => serde_json::to_value(&config.setup_experience)?,
        "release" => serde_json::to_value(&config.release)?,
        "logging" => serde_json::to_value(&config.logging)?,
        "telemetry" => serde_json::to_value(&config.telemetry)?,
        _ => bail!("Unknown component: {name}"),
    };
    Ok(value)
}

fn show_component(cli: &Cli, name: &str) -> Result<()> {
    let config = load(cli, &cli.environment)?;
    let value = section(&config, name)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn compare_configs(cli: &Cli, base: &str, target: &str) -> Result<()> {
    let base_config = load(cli, base)?;
    let target_config = load(cli, target)?;

    let mut differences = 0;
    for name in ["setup_experience", "release", "logging", "telemetry"] {
        let base_value = section(&base_config, name)?;
        let target_value = section(&target_config, name)?;
        if base_value != target_value {
            differences += 1;
            println!("[{name}]");
            println!("  {base}: {base_value}");
            println!("  {target}: {target_value}");
        }
    }

    if differences == 0 {
        println!("No differences between '{base}' and '{target}'");
    }
    Ok(())
}
