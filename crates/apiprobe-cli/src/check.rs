//! # Check -- validate a saved response
//!
//! Offline counterpart of `probe`: the response body is read from a file
//! and the status code given on the command line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use apiprobe_schema::{run, ActualResponse};

use crate::operation::OperationArgs;
use crate::output::{render, ReportArgs};
use crate::request::read_json;

/// Check subcommand arguments.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub operation: OperationArgs,

    /// Saved JSON response body.
    #[arg(long)]
    pub response: PathBuf,

    /// HTTP status the response was returned with.
    #[arg(long, default_value_t = 200)]
    pub status: u16,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    check(args, std::io::stdout().lock())
}

/// Check, rendering to `out`.
pub fn check<W: Write>(args: &CheckArgs, out: W) -> Result<u8> {
    let index = args.operation.load()?;
    let body = read_json(&args.response)?;
    let report = run(&index, &ActualResponse::new(args.status, body));
    render(&report, args.report.format, out)?;
    Ok(args.report.fail_on.exit_code(&report))
}
