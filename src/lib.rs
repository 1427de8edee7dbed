//! buildmig: staged migration and consistency repair for build-tracking
//! databases.
//!
//! Moves owners, projects, packages and (narrowed) build history from an old
//! store into a new one, repairs duplicate package bindings on the way, and
//! reconciles in-flight build statuses afterwards. Built as a library plus a
//! thin CLI so the stages are testable in isolation.
//!
//! The four stages (clean, copy, ensure-rebuild, retry-failed) are
//! independently re-runnable; see [`core::stage`].

pub mod cli;
pub mod core;
