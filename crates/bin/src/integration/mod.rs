//! Integration module for the command-line builds.
//!
//! Wires the per-security pipeline to the blocking thread pool, the progress
//! bar and the on-disk record store.

pub(crate) mod build_runner;
pub(crate) mod store_manager;
