//! Residence imputation runner
//!
//! Loads a policy, a comuna catalog and source fixtures from local JSON
//! files, answers one impute request and prints the JSON response.
//!
//! Usage:
//!     residence-impute --fixtures data/fixtures.json decide --request data/requests/alive.json
//!     echo '{"rut": "11111111", "dv": "1", "vital_status": 2}' | residence-impute decide
//!     residence-impute --policy data/policy.json check-policy

mod app;
mod error;
mod logging;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use app::{load_policy, Runtime, Sources};
use clap::{Parser, Subcommand};
use residence_core::contract::ImputeRequest;
use residence_core::ImputerOptions;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "residence-impute")]
#[command(about = "Impute a person's residence from registry, claims and clinical text")]
#[command(version)]
struct Args {
    /// Policy JSON file (built-in defaults when omitted)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Comuna/region catalog JSON file (built-in catalog when omitted)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Registry and claims fixture JSON file
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one impute request
    Decide {
        /// Request JSON file; read from stdin when omitted
        #[arg(long)]
        request: Option<PathBuf>,

        /// Skip source calls once the time budget is spent
        #[arg(long)]
        skip_on_exhausted_budget: bool,
    },
    /// Validate the policy file and print the effective policy
    CheckPolicy,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    logging::init_with_filter(logging::level_filter(&args.log_level));

    info!("Starting residence-impute v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::CheckPolicy => {
            let policy = load_policy(args.policy.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&policy)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Decide {
            request,
            skip_on_exhausted_budget,
        } => {
            let runtime = Runtime::load(
                Sources {
                    policy: args.policy.as_deref(),
                    catalog: args.catalog.as_deref(),
                    fixtures: args.fixtures.as_deref(),
                },
                ImputerOptions {
                    skip_on_exhausted_budget,
                },
            )?;
            info!("Policy {} active", runtime.policy_version());

            let raw = match request {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let request: ImputeRequest = serde_json::from_str(&raw)?;

            match runtime.handle(&request) {
                Ok(decision) => {
                    println!("{}", serde_json::to_string_pretty(&decision)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
