//! ACDM Node - deploys the platform and replays scenarios against it.

use std::path::PathBuf;

use acdm_node::{telemetry, Ledger, NodeConfig, Scenario, StepOutcome};
use clap::Parser;
use tracing::{error, info};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "acdm-node")]
#[command(about = "ACDM Node - token sale, order book and DAO ledger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Config file path
    #[arg(short, long, value_name = "FILE", env = "ACDM_CONFIG")]
    config: Option<PathBuf>,

    /// Scenario file to replay after genesis
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };

    // Override with CLI args
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }

    config.validate()?;

    if let Some(path) = &args.write_config {
        config.to_file(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    telemetry::init_from_config(&config.logging)?;
    info!(config = ?args.config, "configuration loaded");

    let mut ledger = Ledger::genesis(&config)?;
    println!("{}", serde_json::to_string_pretty(ledger.deployment())?);

    let Some(path) = &args.scenario else {
        info!("no scenario given, genesis only");
        return Ok(());
    };

    let scenario = Scenario::from_file(path)?;
    info!(steps = scenario.steps.len(), path = %path.display(), "replaying scenario");
    match scenario.run(&mut ledger) {
        Ok(outcomes) => {
            let rejected = outcomes
                .iter()
                .filter(|o| matches!(o, StepOutcome::Rejected(_)))
                .count();
            info!(steps = outcomes.len(), rejected, committed = ledger.committed(), "scenario complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "scenario failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args() {
        let args = Args::parse_from(["acdm-node", "--scenario", "flow.json", "--json-logs", "-l", "debug"]);

        assert_eq!(args.scenario, Some(PathBuf::from("flow.json")));
        assert!(args.json_logs);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.write_config.is_none());
    }
}
