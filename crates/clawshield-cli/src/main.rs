//! ClawShield CLI - operator entry point for the agent firewall and skill analyzer.

mod alert;
mod inspect_input;
mod wiring;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use clawshield_core::GatewayConfig;
use clawshield_registry::Storage;

use inspect_input::InspectInput;

#[derive(Parser)]
#[command(name = "clawshield")]
#[command(about = "ClawShield - a firewall and skill analyzer for AI agent gateways")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the gateway (wires persistence and prints readiness; the HTTP/WebSocket
    /// proxy surface itself is out of scope for this facade).
    Start {
        #[arg(short, long, default_value = "config/clawshield.toml")]
        config: String,
    },
    /// Validate a configuration file without starting the gateway.
    Check {
        #[arg(short, long, default_value = "config/clawshield.toml")]
        config: String,
    },
    /// Show gateway status.
    Status,
    /// Read a JSON-encoded request or Agent Message from stdin and print the
    /// resulting InspectionResult.
    Inspect {
        #[arg(short, long, default_value = "config/clawshield.toml")]
        config: String,
    },
    /// Run the Skill Analyzer over a file's contents and print the result.
    Skill {
        file: String,
        #[arg(short, long, default_value = "javascript")]
        language: String,
        #[arg(short, long, default_value = "config/clawshield.toml")]
        config: String,
    },
}

fn load_config(path: &str) -> anyhow::Result<GatewayConfig> {
    if !Path::new(path).exists() {
        return Ok(GatewayConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

fn open_storage(config: &GatewayConfig) -> anyhow::Result<Arc<Storage>> {
    let storage = if config.registry.db_path == PathBuf::default() {
        Storage::temporary()?
    } else {
        Storage::open(&config.registry.db_path)?
    };
    Ok(Arc::new(storage))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt::init();

    match cli.command {
        Some(Commands::Start { config }) => {
            let config = load_config(&config)?;
            let storage = open_storage(&config)?;
            let _orchestrator = wiring::build_orchestrator(config, storage);
            println!("ClawShield gateway ready");
        }
        Some(Commands::Check { config }) => match load_config(&config) {
            Ok(parsed) => {
                println!("Config OK: rate_limit_default_per_minute={}, threat_score_threshold={}, dynamic_timeout_ms={}",
                    parsed.firewall.rate_limit_default_per_minute,
                    parsed.firewall.threat_score_threshold,
                    parsed.skills.clamped_dynamic_timeout_ms());
            }
            Err(err) => {
                eprintln!("Config invalid: {err}");
                std::process::exit(1);
            }
        },
        Some(Commands::Status) => {
            println!("ClawShield status: READY");
        }
        Some(Commands::Inspect { config }) => {
            let config = load_config(&config)?;
            let storage = open_storage(&config)?;
            let orchestrator = wiring::build_orchestrator(config, storage);

            let mut raw_stdin = String::new();
            std::io::stdin().read_to_string(&mut raw_stdin)?;
            let input: InspectInput = serde_json::from_str(&raw_stdin)?;

            let result = match input {
                InspectInput::Request { agent_id, method, path, body, headers, ip } => {
                    orchestrator
                        .inspect_request(
                            agent_id.as_deref(),
                            &method,
                            &path,
                            body.as_deref(),
                            headers.as_ref(),
                            ip.as_deref(),
                        )
                        .await
                }
                InspectInput::Message { agent_id, raw } => {
                    orchestrator.inspect_message(&agent_id, &raw.to_string()).await
                }
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some(Commands::Skill { file, language, config }) => {
            let config = load_config(&config)?;
            let storage = open_storage(&config)?;
            let orchestrator = wiring::build_orchestrator(config, storage);

            let code = std::fs::read_to_string(&file)?;
            let result = orchestrator.analyze_skill(&code, &language).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        None => {
            println!("ClawShield v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
