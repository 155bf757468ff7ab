//! `reqstrategy` CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse arguments** — a subcommand per strategy, or `plan` to load a
//!    JSON plan file. Both produce a [`config::Plan`], which is validated
//!    before anything is sent.
//! 2. **Wire observability** — install a `tracing-subscriber` that writes to
//!    stderr; see [`observability`].
//! 3. **Construct infrastructure** — build the `reqwest`-backed
//!    [`transport::HttpClient`] and hand it to the strategy.
//! 4. **Report** — print a JSON [`report::Report`] to stdout. The exit code is
//!    `0` when the strategy succeeded, `1` when it failed, and `2` when the
//!    plan could not be run at all.

mod config;
mod observability;
mod report;
mod run;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::{Plan, RequestSpec, StrategyKind};
use crate::observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "reqstrategy", version, about = "Run HTTP requests under a coordination strategy")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "REQSTRATEGY_LOG_FORMAT")]
    log_format: LogFormat,

    /// Deadline for the whole invocation, in milliseconds. Overrides a plan's `timeout_ms`.
    #[arg(long, global = true, env = "REQSTRATEGY_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one request and validate the response.
    Do {
        #[command(flatten)]
        request: RequestArgs,
        /// Target URL.
        url: String,
    },
    /// Send to every URL at once; print the first accepted response.
    Race {
        #[command(flatten)]
        request: RequestArgs,
        /// Target URLs.
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Send to every URL at once; succeed only if all are accepted.
    All {
        #[command(flatten)]
        request: RequestArgs,
        /// Target URLs.
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Send to every URL at once; keep whatever was accepted.
    Some {
        #[command(flatten)]
        request: RequestArgs,
        /// Target URLs.
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Send one request, retrying after each listed interval.
    Retry {
        #[command(flatten)]
        request: RequestArgs,
        /// Wait before each retry, in milliseconds. Repeat for more retries.
        #[arg(long = "interval-ms", value_name = "MS")]
        intervals_ms: Vec<u64>,
        /// Target URL.
        url: String,
    },
    /// Run a JSON plan file.
    Plan {
        /// Path to the plan.
        path: PathBuf,
    },
}

/// Request options shared by every strategy subcommand.
#[derive(Debug, Args)]
struct RequestArgs {
    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Accepted status code. Repeat to accept several; any status is accepted when omitted.
    #[arg(short, long = "status", value_name = "CODE")]
    statuses: Vec<u16>,

    /// Extra header as `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header", value_name = "HEADER", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

impl RequestArgs {
    fn specs(&self, urls: Vec<String>) -> Vec<RequestSpec> {
        let headers: BTreeMap<String, String> = self.headers.iter().cloned().collect();
        urls.into_iter()
            .map(|url| RequestSpec {
                method: self.method.clone(),
                url,
                headers: headers.clone(),
                body: None,
                status: self.statuses.clone(),
            })
            .collect()
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

impl Command {
    fn into_plan(self) -> anyhow::Result<Plan> {
        let plan = match self {
            Command::Do { request, url } => Plan::new(StrategyKind::Do, request.specs(vec![url])),
            Command::Race { request, urls } => Plan::new(StrategyKind::Race, request.specs(urls)),
            Command::All { request, urls } => Plan::new(StrategyKind::All, request.specs(urls)),
            Command::Some { request, urls } => Plan::new(StrategyKind::Some, request.specs(urls)),
            Command::Retry {
                request,
                intervals_ms,
                url,
            } => {
                let mut plan = Plan::new(StrategyKind::Retry, request.specs(vec![url]));
                plan.intervals_ms = intervals_ms;
                plan
            }
            Command::Plan { path } => Plan::load(&path)?,
        };
        Ok(plan)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    observability::init(cli.log_format)?;

    let mut plan = match cli.command.into_plan() {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(error = %e, "could not load plan");
            return Ok(ExitCode::from(2));
        }
    };
    if cli.timeout_ms.is_some() {
        plan.timeout_ms = cli.timeout_ms;
    }
    if let Err(e) = plan.validate() {
        tracing::error!(error = %e, "invalid plan");
        return Ok(ExitCode::from(2));
    }

    let report = match run::run(&plan).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "plan could not run");
            return Ok(ExitCode::from(2));
        }
    };

    let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{json}");

    Ok(if report.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: application/json").unwrap(),
            ("Accept".to_owned(), "application/json".to_owned())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_race_subcommand_builds_plan() {
        let cli = Cli::try_parse_from([
            "reqstrategy",
            "race",
            "-s",
            "200",
            "-H",
            "X-Trace: 1",
            "http://a/",
            "http://b/",
        ])
        .unwrap();

        let plan = cli.command.into_plan().unwrap();
        assert_eq!(plan.strategy, StrategyKind::Race);
        assert_eq!(plan.requests.len(), 2);
        assert_eq!(plan.requests[1].status, vec![200]);
        assert_eq!(plan.requests[0].headers.get("X-Trace").map(String::as_str), Some("1"));
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_retry_subcommand_collects_intervals() {
        let cli = Cli::try_parse_from([
            "reqstrategy",
            "retry",
            "--interval-ms",
            "100",
            "--interval-ms",
            "200",
            "http://a/",
        ])
        .unwrap();

        let plan = cli.command.into_plan().unwrap();
        assert_eq!(plan.intervals_ms, vec![100, 200]);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_race_requires_urls() {
        assert!(Cli::try_parse_from(["reqstrategy", "race"]).is_err());
    }
}
