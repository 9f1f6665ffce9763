//! # Probe -- validate a live response
//!
//! Loads the operation's response schemas, signs in, calls the operation
//! once and reports the captured response against every declared label.
//!
//! A failed sign-in or call is logged and ends the run with nothing
//! validated; whether that is a failure is up to `--fail-on`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use apiprobe_client::{ClientError, Method, SessionClient, SessionConfig};
use apiprobe_schema::{run, ActualResponse, HttpMethod, OperationKey};

use crate::operation::OperationArgs;
use crate::output::{render, ReportArgs};
use crate::request::load_body;

/// Probe subcommand arguments.
#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub operation: OperationArgs,

    /// JSON request body. Defaults to the built-in investment-firm filter.
    #[arg(long)]
    pub body: Option<PathBuf>,

    /// Base URL of the API under test. Overrides `API_BASE_URL`.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds. Overrides `API_TIMEOUT_SECS`.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl ProbeArgs {
    /// Session configuration from the environment, with flag overrides applied.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::from_env().context("invalid session configuration")?;
        if let Some(raw) = &self.base_url {
            config.base_url = raw
                .parse()
                .with_context(|| format!("invalid --base-url '{raw}'"))?;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = Some(secs);
        }
        Ok(config)
    }
}

/// Execute the probe subcommand.
pub fn run_probe(args: &ProbeArgs) -> Result<u8> {
    let config = args.session_config()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(probe(args, config, std::io::stdout().lock()))
}

/// Probe with an explicit session configuration, rendering to `out`.
pub async fn probe<W: Write>(args: &ProbeArgs, config: SessionConfig, out: W) -> Result<u8> {
    let index = args.operation.load()?;
    let body = load_body(args.body.as_deref())?;
    let key = args.operation.key();

    let actual = match fetch(config, &key, &body).await {
        Ok(actual) => actual,
        Err(e) => {
            tracing::error!(operation = %key, error = %e, "no response captured; nothing validated");
            return Ok(args.report.fail_on.unverified_exit_code());
        }
    };

    let report = run(&index, &actual);
    render(&report, args.report.format, out).context("failed to write report")?;
    Ok(args.report.fail_on.exit_code(&report))
}

async fn fetch(
    config: SessionConfig,
    key: &OperationKey,
    body: &Value,
) -> Result<ActualResponse, ClientError> {
    let client = SessionClient::new(config)?;
    let credential = client.sign_in().await?;
    let response = client
        .call(&key.path, client_method(key.method), Some(body), &credential)
        .await?;
    tracing::info!(status = response.status, "captured API response");
    Ok(ActualResponse::new(response.status, response.body))
}

fn client_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Trace => Method::TRACE,
    }
}
