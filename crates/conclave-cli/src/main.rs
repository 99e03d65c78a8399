//! Conclave CLI - inspect and validate council engine configuration

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use conclave_core::EngineConfig;

#[derive(Parser)]
#[command(name = "conclave")]
#[command(about = "Conclave - Multi-Model Council Engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/conclave.json")]
        config: String,
    },
    /// Print the effective configuration (defaults merged in)
    Show {
        /// Configuration file path
        #[arg(short, long, default_value = "config/conclave.json")]
        config: String,
    },
    /// Show engine status
    Status,
}

fn load_config(path: &str) -> anyhow::Result<EngineConfig> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config = EngineConfig::from_json(&raw).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match cli.command {
        Some(Commands::Check { config }) => {
            load_config(&config)?;
            println!("Config OK: {}", config);
        }
        Some(Commands::Show { config }) => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(Commands::Status) => {
            println!("Conclave status: READY");
        }
        None => {
            println!("Conclave v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
