//! # apiprobe-cli -- Response Contract Probe
//!
//! Provides the `apiprobe` command-line interface.
//!
//! ## Subcommands
//!
//! - `apiprobe probe`: sign in, call the operation once, check the live
//!   response against every declared response label.
//! - `apiprobe check`: the same check against a response saved on disk.
//!
//! ```bash
//! apiprobe probe --spec venus.json
//! apiprobe probe --spec venus.json --format json --fail-on matching
//! apiprobe check --spec venus.json --response page.json --status 200
//! ```
//!
//! The schema is always loaded before any network traffic, so a broken
//! document fails fast. Exit codes are decided by [`policy::FailOn`].

pub mod check;
pub mod operation;
pub mod output;
pub mod policy;
pub mod probe;
pub mod request;
