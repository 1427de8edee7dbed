//! Stage orchestration.
//!
//! Four numbered stages, each one destination transaction, committed before
//! the next begins:
//!
//!   0. Clean      - delete every owned destination row, children first
//!   1. Copy       - move the graph across stores (preceded by the rebind
//!                   fix-up on the source, unless skipped)
//!   2. Rebuild    - Phase A: succeeded -> pending|importing
//!   3. Retry      - Phase B: failed -> pending, fixed sweep count
//!
//! Any stage can be re-run on its own; the documented recovery path after a
//! partial failure is stage 0 followed by the full sequence.

use crate::core::config::MigrateConfig;
use crate::core::copier::{self, CopyStats};
use crate::core::error::MigrateError;
use crate::core::rebind::{self, REBIND_FIXES};
use crate::core::reconcile::{self, RetryOutcome};
use crate::core::store::{self, DestStore, SourceStore};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSelector {
    All,
    One(u8),
}

impl StageSelector {
    /// Validate the raw `--stage` argument. Anything outside 0..=3 is
    /// rejected before either store is opened.
    pub fn parse(raw: Option<i64>) -> Result<Self, MigrateError> {
        match raw {
            None => Ok(StageSelector::All),
            Some(n @ 0..=3) => Ok(StageSelector::One(n as u8)),
            Some(n) => Err(MigrateError::InvalidStage(n)),
        }
    }

    fn includes(self, stage: u8) -> bool {
        match self {
            StageSelector::All => true,
            StageSelector::One(n) => n == stage,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the source-side rebind fix-up before the copy stage (already
    /// applied in a previous run, or applied out of band).
    pub skip_rebind: bool,
    /// Suppress per-stage banners; used when the caller emits a JSON report.
    pub quiet: bool,
}

/// What a run did, for the final summary and the JSON output mode.
#[derive(Debug, Default, Serialize)]
pub struct MigrationReport {
    pub stages_run: Vec<u8>,
    pub rebound_builds: Option<usize>,
    pub copy: Option<CopyStats>,
    pub rebuild_demoted: Option<usize>,
    pub retry: Option<RetryOutcome>,
}

fn banner(quiet: bool, text: &str) {
    if !quiet {
        println!("{}", format!("### {text} ###").bold());
    }
}

/// Run the selected stage, or all four in order. Fail-fast: the first stage
/// error aborts the run with that stage uncommitted.
pub fn run(
    config: &MigrateConfig,
    selector: StageSelector,
    opts: RunOptions,
) -> Result<MigrationReport, MigrateError> {
    let mut report = MigrationReport::default();
    let mut dest = DestStore::open(&config.destination)?;
    dest.init_schema()?;

    if selector.includes(0) {
        banner(opts.quiet, "Stage 0 - Cleaning");
        dest.with_stage_tx(|tx| store::clean(tx))?;
        report.stages_run.push(0);
    }

    if selector.includes(1) {
        let mut src = SourceStore::open(&config.source)?;
        if !opts.skip_rebind {
            banner(opts.quiet, "Rebinding duplicate packages (source)");
            let moved = src.with_rebind_tx(|tx| rebind::apply_fixes(tx, REBIND_FIXES))?;
            if !opts.quiet {
                println!("rebound {moved} build(s)");
            }
            report.rebound_builds = Some(moved);
        }
        banner(opts.quiet, "Stage 1 - Copy data");
        let stats = dest.with_stage_tx(|tx| copier::copy_all(&src, tx))?;
        if !opts.quiet {
            println!(
                "copied {} owner(s), {} project(s), {} package(s), {} build(s), {} target(s)",
                stats.owners, stats.projects, stats.packages, stats.builds, stats.targets
            );
        }
        report.copy = Some(stats);
        report.stages_run.push(1);
    }

    if selector.includes(2) {
        banner(opts.quiet, "Stage 2 - succeeded -> [pending|importing]");
        let demoted = dest.with_stage_tx(|tx| reconcile::ensure_rebuild(tx))?;
        if !opts.quiet {
            println!("demoted {demoted} target(s) for re-validation");
        }
        report.rebuild_demoted = Some(demoted);
        report.stages_run.push(2);
    }

    if selector.includes(3) {
        banner(opts.quiet, "Stage 3 - failed -> pending (repeat)");
        let outcome = dest.with_stage_tx(|tx| reconcile::retry_failed(tx))?;
        if !opts.quiet {
            report_exhaustion(&outcome);
        }
        report.retry = Some(outcome);
        report.stages_run.push(3);
    }

    Ok(report)
}

/// The exhaustion list is printed on every run that reaches stage 3, even
/// when it is empty, so operators never have to guess.
fn report_exhaustion(outcome: &RetryOutcome) {
    if outcome.exhausted.is_empty() {
        println!(
            "retried {} target(s); none exhausted",
            outcome.transitioned
        );
        return;
    }
    println!(
        "{}",
        format!(
            "WARNING: {} target(s) still failed after {} sweeps:",
            outcome.exhausted.len(),
            reconcile::RETRY_SWEEPS
        )
        .yellow()
        .bold()
    );
    for t in &outcome.exhausted {
        println!(
            "  {} build_target id={} build_id={} target={}",
            "!".yellow(),
            t.id,
            t.build_id,
            t.target
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_accepts_known_stages() {
        assert_eq!(StageSelector::parse(None).unwrap(), StageSelector::All);
        for n in 0..=3 {
            assert_eq!(
                StageSelector::parse(Some(n)).unwrap(),
                StageSelector::One(n as u8)
            );
        }
    }

    #[test]
    fn test_selector_rejects_out_of_range() {
        for bad in [-1, 4, 99] {
            assert!(matches!(
                StageSelector::parse(Some(bad)),
                Err(MigrateError::InvalidStage(n)) if n == bad
            ));
        }
    }
}
