//! Command-line front-end for running a single back-test from a portfolio
//! specification file and a returns JSON file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use porttree::cancel::CancelToken;
use porttree::persistence::{self, ReturnsTable};
use porttree::spec::PortfolioSpec;

/// Run a back-test against a portfolio specification.
#[derive(Parser, Debug)]
#[command(name = "backtest-run", version)]
struct Cli {
    /// Path to a `*_portfolio.yml` specification file.
    #[arg(long)]
    spec: PathBuf,

    /// Path to a JSON file with `{times, values}` asset returns.
    #[arg(long)]
    returns: PathBuf,

    /// Where to write the persisted JSON result. Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> porttree::Result<()> {
    let cli = Cli::parse();

    let yaml = std::fs::read_to_string(&cli.spec)
        .map_err(|e| porttree::Error::DecodeFailure(format!("{}: {e}", cli.spec.display())))?;
    let specs = PortfolioSpec::parse_documents(&yaml)?;
    let spec = specs
        .into_iter()
        .next()
        .ok_or_else(|| porttree::Error::DecodeFailure("no Portfolio documents found".to_string()))?;
    spec.validate()?;

    let returns_json = std::fs::read_to_string(&cli.returns)
        .map_err(|e| porttree::Error::DecodeFailure(format!("{}: {e}", cli.returns.display())))?;
    let wire: ReturnsTable = serde_json::from_str(&returns_json)?;
    let table = wire.into_table()?;

    info!("running back-test for {} assets", table.number_of_columns());

    let mut cancel = CancelToken::never();
    let result = spec.backtest(&mut cancel, None, None, &table, None)?;

    let persisted = persistence::PersistedResult::from(&result);
    let json = serde_json::to_string_pretty(&persisted)?;
    match cli.output {
        Some(path) => std::fs::write(&path, json)
            .map_err(|e| porttree::Error::DecodeFailure(format!("{}: {e}", path.display())))?,
        None => println!("{json}"),
    }
    Ok(())
}
