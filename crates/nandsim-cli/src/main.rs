//! # nandsim
//!
//! Interactive circuit simulator. Steps run on a fixed interval and are
//! logged to a file; commands are read from stdin:
//!
//! ```text
//! > set a 1
//! set!
//! > get out
//! 1
//! > exit
//! ```

mod demos;
mod prompt;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nandsim::RunConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::demos::Demo;

#[derive(Parser, Debug)]
#[command(author, version, about = "Discrete-step NAND circuit simulator", long_about = None)]
struct Args {
    /// Circuit to simulate.
    #[arg(long, value_enum, default_value_t = Demo::Xor)]
    circuit: Demo,
    /// JSON run configuration. Flags below override its fields.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Milliseconds between steps.
    #[arg(long)]
    step_ms: Option<u64>,
    /// Step log file, truncated at start.
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let circuit = args.circuit.build().context("failed to build circuit")?;

    info!(
        circuit = ?args.circuit,
        log = %config.log_path.display(),
        step_ms = config.step_interval_ms,
        "starting simulation"
    );
    let (simulation, handle) = circuit
        .launch(&config)
        .context("failed to start simulation")?;
    prompt::spawn(handle).context("failed to start prompt")?;

    simulation.run().await.context("simulation failed")?;
    Ok(())
}

/// Defaults, then the config file if given, then flags.
fn load_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            RunConfig::from_json(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => RunConfig::default(),
    };

    if let Some(step_ms) = args.step_ms {
        config = config.with_step_interval_ms(step_ms);
    }
    if let Some(log) = &args.log {
        config = config.with_log_path(log);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("nandsim").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_flags() {
        let args = args(&[]);
        assert_eq!(args.circuit, Demo::Xor);
        assert_eq!(load_config(&args).unwrap(), RunConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, r#"{ "step_interval_ms": 250, "log_path": "file.log" }"#).unwrap();

        let args = args(&[
            "--circuit",
            "half-adder",
            "--config",
            path.to_str().unwrap(),
            "--log",
            "flag.log",
        ]);
        let config = load_config(&args).unwrap();

        assert_eq!(args.circuit, Demo::HalfAdder);
        assert_eq!(config.step_interval_ms, 250);
        assert_eq!(config.log_path, PathBuf::from("flag.log"));
    }

    #[test]
    fn zero_step_interval_is_rejected() {
        assert!(load_config(&args(&["--step-ms", "0"])).is_err());
    }

    #[test]
    fn unreadable_config_names_the_file() {
        let err = load_config(&args(&["--config", "/no/such/nandsim.json"])).unwrap_err();
        assert!(err.to_string().contains("/no/such/nandsim.json"));
    }
}
