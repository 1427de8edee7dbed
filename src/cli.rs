//! Clap definitions for the `buildmig` command line.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "buildmig",
    version = env!("CARGO_PKG_VERSION"),
    about = "Staged migration of a build-tracking database: clean, copy, ensure-rebuild, retry-failed."
)]
pub struct Cli {
    /// Run only this stage (0 = clean, 1 = copy, 2 = ensure-rebuild,
    /// 3 = retry-failed). Default: all stages in order.
    #[clap(short, long)]
    pub stage: Option<i64>,
    /// TOML file naming the source and destination databases.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Do not apply the duplicate-package rebind fixes before copying.
    #[clap(long)]
    pub skip_rebind: bool,
    /// Output format for the run summary.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}
