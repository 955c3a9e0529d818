//! CueTips entry point
//!
//! Reads a shot description (JSON) from a file, runs the simulation and
//! prints the resulting path as JSON on stdout.
//!
//! Usage: `cuetips <shot.json> [--paced]`

use std::process::ExitCode;

use cuetips::{Pacing, Result, ShotInput, simulate_shot};

fn run(path: &str, pacing: Pacing) -> Result<()> {
    let json = std::fs::read_to_string(path)?;
    let input: ShotInput = serde_json::from_str(&json)?;
    let shot = simulate_shot(&input, pacing, None)?;
    println!("{}", serde_json::to_string_pretty(&shot)?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut path = None;
    let mut pacing = Pacing::Unpaced;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--paced" => pacing = Pacing::RealTime,
            _ if path.is_none() => path = Some(arg),
            _ => {
                log::error!("unexpected argument: {arg}");
                return ExitCode::FAILURE;
            }
        }
    }

    let Some(path) = path else {
        log::error!("usage: cuetips <shot.json> [--paced]");
        return ExitCode::FAILURE;
    };

    log::info!("CueTips starting: {path}");
    match run(&path, pacing) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
