use std::process::ExitCode;

use capability_agent::config::{AgentProfile, Config};
use capability_agent::error::Result;
use capability_agent::factories::agent_factory::CapabilityAgentFactory;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "capability-agent")]
#[command(about = "Serves wallet, marketing or search capabilities to an agent runtime")]
struct Cli {
    #[arg(long, value_enum, env = "AGENT_PROFILE", default_value = "wallet")]
    profile: AgentProfile,

    /// JSON config file; environment values take precedence.
    #[arg(long, env = "CAPABILITY_AGENT_CONFIG")]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config.as_deref() {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut config = base.overlay(Config::from_env()?);
    if let Some(host) = &cli.host {
        config.host = Some(host.clone());
    }
    if let Some(port) = cli.port {
        config.port = Some(port);
    }
    Ok(config)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        futures::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> ExitCode {
    capability_agent::logging::init_tracing("capability_agent");
    let cli = Cli::parse();

    let host = match load_config(&cli)
        .and_then(|config| CapabilityAgentFactory::create_from_config(cli.profile, &config))
    {
        Ok(host) => host,
        Err(err) => {
            error!(profile = cli.profile.as_str(), error = %err, "startup aborted");
            return ExitCode::FAILURE;
        }
    };

    match host.start_with_shutdown(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "capability host failed to start");
            ExitCode::FAILURE
        }
    }
}
