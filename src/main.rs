use std::process::ExitCode;

use log::error;
use timetable_engine::{GenerationInput, generate, server};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runs one generation on a JSON input file and prints the result.
fn run_once(path: &str) -> Result<(), String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    let input: GenerationInput =
        serde_json::from_str(&raw).map_err(|e| format!("invalid input in {path}: {e}"))?;
    let output = generate(&input).map_err(|e| format!("invalid configuration: {e}"))?;
    let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match std::env::args().nth(1) {
        Some(path) => run_once(&path),
        None => {
            let addr = std::env::var("TIMETABLE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
            server::run_server(&addr)
                .await
                .map_err(|e| format!("server on {addr} stopped: {e}"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
