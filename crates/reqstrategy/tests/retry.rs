//! Behaviour of the retry coordinator.

mod common;

use std::time::Duration;

use common::{require_ok, FakeClient, Reply};
use reqstrategy::{retry, Backoff, CallContext, Error};
use tokio::time::Instant;

fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_on_third_attempt() {
    let client = FakeClient::new(|_, call| {
        if call <= 2 {
            Reply::status_after(0, 500)
        } else {
            Reply::status_after(0, 200)
        }
    });

    let response = retry(&client, &require_ok("/"), ms(&[100, 100, 100]))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(client.started(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_returns_last_response_and_error_when_exhausted() {
    let client = FakeClient::new(|_, _| Reply::status_after(0, 500));

    let failure = retry(&client, &require_ok("/"), ms(&[100, 100, 100]))
        .await
        .unwrap_err();

    assert_eq!(failure.response().map(|r| r.status), Some(500));
    assert_eq!(
        failure.to_string(),
        "GET http://localhost/: expected response status [200], got 500"
    );
    assert_eq!(client.started(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_retry_accepts_an_endless_schedule() {
    let client = FakeClient::new(|_, call| {
        if call < 50 {
            Reply::status_after(0, 503)
        } else {
            Reply::status_after(0, 200)
        }
    });

    let response = retry(&client, &require_ok("/"), std::iter::repeat(Duration::ZERO))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(client.started(), 50);
}

#[tokio::test(start_paused = true)]
async fn test_retry_without_intervals_is_a_single_call() {
    let client = FakeClient::new(|_, _| Reply::status_after(0, 500));

    let failure = retry(&client, &require_ok("/"), []).await.unwrap_err();

    assert!(matches!(failure.error(), Error::Rejected(_)));
    assert_eq!(client.started(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_each_interval_once() {
    let client = FakeClient::new(|_, _| Reply::status_after(0, 500));
    let started = Instant::now();

    let _ = retry(&client, &require_ok("/"), ms(&[100, 200, 300])).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(600), "waited {elapsed:?}");
    assert!(elapsed < Duration::from_millis(650), "waited {elapsed:?}");
    assert_eq!(client.started(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_retry_deadline_during_wait_wins_over_rejection() {
    let client = FakeClient::new(|_, _| Reply::status_after(0, 500));
    let ctx = CallContext::new().with_timeout(Duration::from_millis(150));

    let failure = retry(&client, &require_ok("/").with_context(ctx), ms(&[100, 100, 100]))
        .await
        .unwrap_err();

    assert!(matches!(failure.error(), Error::DeadlineExceeded));
    assert!(failure.response().is_none());
    assert_eq!(client.started(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_cancellation_during_wait() {
    let client = FakeClient::new(|_, _| Reply::Transport {
        delay: Duration::ZERO,
        message: "connection refused",
    });
    let ctx = CallContext::new();
    let request = require_ok("/").with_context(ctx.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.cancel();
    });
    let failure = retry(&client, &request, ms(&[1000])).await.unwrap_err();
    canceller.await.unwrap();

    assert!(failure.error().is_cancellation());
    assert!(matches!(failure.into_error(), Error::Cancelled));
    assert_eq!(client.started(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_with_exponential_backoff() {
    let client = FakeClient::new(|_, call| {
        if call <= 3 {
            Reply::status_after(0, 503)
        } else {
            Reply::status_after(0, 200)
        }
    });
    let backoff = Backoff::exponential(Duration::from_millis(100), 2, 5);
    let started = Instant::now();

    let response = retry(&client, &require_ok("/"), backoff.intervals()).await.unwrap();

    assert_eq!(response.status, 200);
    // 100 + 200 + 400: the remaining intervals are never waited out.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(700), "waited {elapsed:?}");
    assert!(elapsed < Duration::from_millis(750), "waited {elapsed:?}");
}
