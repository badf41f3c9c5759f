//! Prints generated carpool demo data for a named registry seed as JSON.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use example_data::{SeedRegistry, generate_example_data};

/// Generate deterministic carpool demo data.
#[derive(Debug, Parser)]
#[command(name = "example-data-seed", version)]
struct Cli {
    /// Path to the seed registry JSON file.
    #[arg(long)]
    registry: PathBuf,
    /// Seed name to generate.
    #[arg(long)]
    name: String,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(json) => {
            if let Err(err) = writeln!(io::stdout().lock(), "{json}") {
                drop(err);
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            if let Err(err) = writeln!(io::stderr().lock(), "{message}") {
                drop(err);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, String> {
    let registry = SeedRegistry::from_file(&cli.registry).map_err(|e| e.to_string())?;
    let seed_def = registry.find_seed(&cli.name).map_err(|e| e.to_string())?;
    let data = generate_example_data(seed_def).map_err(|e| e.to_string())?;
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&data)
    } else {
        serde_json::to_string(&data)
    };
    rendered.map_err(|e| e.to_string())
}
