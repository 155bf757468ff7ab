//! Plan execution.

use std::sync::Arc;

use anyhow::Context;
use reqstrategy::CallFailure;
use tokio::time::Instant;
use tracing::{info, warn};
use transport::{HttpClient, HttpResponse, ValidatedRequest};

use crate::config::{Plan, StrategyKind};
use crate::report::{Report, ResponseSummary, Timestamp};

/// Runs a validated plan and reports what happened.
///
/// A strategy failure is part of the report, not an `Err`; only setup
/// problems (bad requests, client construction) are returned as errors.
pub async fn run(plan: &Plan) -> anyhow::Result<Report> {
    let client = Arc::new(HttpClient::new(&plan.client).context("failed to build HTTP client")?);
    let requests = plan.build_requests().context("invalid plan")?;

    let started_at = Timestamp::now();
    let clock = Instant::now();
    let outcome = dispatch(&client, plan, requests).await;
    let elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

    let report = match outcome {
        Ok(responses) => {
            info!(strategy = %plan.strategy, elapsed_ms, "plan succeeded");
            Report::success(plan.strategy, started_at, elapsed_ms, responses)
        }
        Err(failure) => {
            let (response, error) = failure.into_parts();
            warn!(strategy = %plan.strategy, elapsed_ms, error = %error, "plan failed");
            let responses = response
                .map(|r| vec![Some(ResponseSummary::from(&r))])
                .unwrap_or_default();
            Report::failure(plan.strategy, started_at, elapsed_ms, error.to_string(), responses)
        }
    };
    Ok(report)
}

type Slots = Vec<Option<ResponseSummary>>;

async fn dispatch(
    client: &Arc<HttpClient>,
    plan: &Plan,
    mut requests: Vec<ValidatedRequest>,
) -> Result<Slots, CallFailure<HttpResponse>> {
    let summary = |response: &HttpResponse| Some(ResponseSummary::from(response));

    match plan.strategy {
        StrategyKind::Do | StrategyKind::Retry => {
            let request = requests.pop().ok_or(reqstrategy::Error::AllFailed)?;
            let response = if plan.strategy == StrategyKind::Retry {
                reqstrategy::retry(client.as_ref(), &request, plan.intervals()).await?
            } else {
                reqstrategy::execute(client.as_ref(), &request).await?
            };
            Ok(vec![summary(&response)])
        }
        StrategyKind::Race => {
            let response = reqstrategy::race(client, requests).await?;
            Ok(vec![summary(&response)])
        }
        StrategyKind::All => {
            let responses = reqstrategy::all(client, requests).await?;
            Ok(responses.iter().map(summary).collect())
        }
        StrategyKind::Some => {
            let responses = reqstrategy::some(client, requests).await?;
            Ok(responses.iter().map(|slot| slot.as_ref().and_then(summary)).collect())
        }
    }
}
