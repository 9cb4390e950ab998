use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::history::{HistoricalOutcome, HistoricalOutcomeStore};
use crate::model::{RunStatus, Scenario};
use crate::SimulationEngine;

const USAGE: &str = "usage: kriegspiel <simulate|catalog>";
const SIMULATE_USAGE: &str =
    "usage: kriegspiel simulate <scenario.json|scenario.yaml> [--seed N] [--catalog FILE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Catalog,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Install the stderr log subscriber. Filter comes from `KRIEGSPIEL_LOG`, default `warn`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_env("KRIEGSPIEL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("catalog") => Some(Command::Catalog),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Catalog) => handle_catalog(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_simulate(args: &[String]) -> i32 {
    let Some(path) = args.get(2).filter(|arg| !arg.starts_with("--")) else {
        eprintln!("{SIMULATE_USAGE}");
        return 2;
    };
    let seed = match flag_value(args, "--seed").map(|raw| raw.parse::<u64>()) {
        None => None,
        Some(Ok(seed)) => Some(seed),
        Some(Err(_)) => {
            eprintln!("invalid --seed value\n{SIMULATE_USAGE}");
            return 2;
        }
    };

    let mut scenario: Scenario = match read_document(path) {
        Ok(scenario) => scenario,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    if seed.is_some() {
        scenario.config.seed = seed;
    }
    let store = match flag_value(args, "--catalog") {
        Some(catalog) => match read_document::<Vec<HistoricalOutcome>>(catalog) {
            Ok(records) => HistoricalOutcomeStore::load(records),
            Err(err) => {
                eprintln!("{err}");
                return 1;
            }
        },
        None => HistoricalOutcomeStore::curated(),
    };

    let engine = SimulationEngine::new(EngineConfig::from_env(), store.shared());
    let result = match engine.run(&scenario) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("invalid scenario: {err}");
            return 1;
        }
    };
    if let Err(err) = print_json(&result) {
        eprintln!("{err}");
        return 1;
    }
    match result.status {
        RunStatus::Success | RunStatus::Partial => 0,
        RunStatus::Failed => 1,
    }
}

fn handle_catalog(args: &[String]) -> i32 {
    let store = HistoricalOutcomeStore::curated();
    let keywords = args.get(2..).unwrap_or_default();
    let matches = store.find_relevant(keywords);
    match print_json(&matches) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// JSON or YAML, chosen by file extension.
fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    let is_yaml = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let parsed = if is_yaml {
        serde_yaml::from_str(&raw).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(&raw).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| CliError::Parse {
        path: path.to_string(),
        message,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}
