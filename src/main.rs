use buildmig::cli::{Cli, OutputFormat};
use buildmig::core::config::MigrateConfig;
use buildmig::core::error::MigrateError;
use buildmig::core::stage::{self, RunOptions, StageSelector};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            match err.downcast_ref::<MigrateError>() {
                Some(MigrateError::InvalidStage(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Selector validation comes first: a bad stage number must not touch
    // either store.
    let selector = StageSelector::parse(cli.stage)?;
    let config = match &cli.config {
        Some(path) => MigrateConfig::load(path)?,
        None => MigrateConfig::default_paths(),
    };
    let opts = RunOptions {
        skip_rebind: cli.skip_rebind,
        quiet: cli.format == OutputFormat::Json,
    };
    let report = stage::run(&config, selector, opts)?;
    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
