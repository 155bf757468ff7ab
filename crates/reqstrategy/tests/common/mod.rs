//! In-memory client used by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqstrategy::{CallContext, Client, Error, HasStatus, Request, Target};

pub struct FakeRequest {
    pub path: &'static str,
    url: String,
}

impl Target for FakeRequest {
    fn method(&self) -> &str {
        "GET"
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeResponse {
    pub path: &'static str,
    pub status: u16,
}

impl HasStatus for FakeResponse {
    fn status(&self) -> u16 {
        self.status
    }
}

/// What the fake server does with one call.
pub enum Reply {
    /// Respond with `status` after `delay`.
    Status { delay: Duration, status: u16 },
    /// Fail below the response layer after `delay`.
    Transport { delay: Duration, message: &'static str },
    /// Never respond; only the context can end the call.
    Hang,
}

impl Reply {
    pub fn status_after(ms: u64, status: u16) -> Self {
        Self::Status {
            delay: Duration::from_millis(ms),
            status,
        }
    }
}

type Handler = dyn Fn(&FakeRequest, usize) -> Reply + Send + Sync;

/// Answers calls from a handler and counts what happened to them.
///
/// The handler receives the request and the 1-based number of the call.
pub struct FakeClient {
    handler: Box<Handler>,
    started: AtomicUsize,
    completed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl FakeClient {
    pub fn new(handler: impl Fn(&FakeRequest, usize) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
        }
    }

    /// The `/a` (slow 200), `/b` (fast 500), `/c` (slowest 200) server.
    pub fn abc() -> Self {
        Self::new(|request, _| match request.path {
            "/a" => Reply::status_after(200, 200),
            "/b" => Reply::status_after(100, 500),
            "/c" => Reply::status_after(300, 200),
            other => panic!("wrong path: {other}"),
        })
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Client for FakeClient {
    type Request = FakeRequest;
    type Response = FakeResponse;

    async fn call(&self, request: &FakeRequest, ctx: &CallContext) -> Result<FakeResponse, Error> {
        let number = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let (delay, result) = match (self.handler)(request, number) {
            Reply::Status { delay, status } => (
                delay,
                Ok(FakeResponse {
                    path: request.path,
                    status,
                }),
            ),
            Reply::Transport { delay, message } => (delay, Err(Error::transport(message))),
            Reply::Hang => (Duration::from_secs(3600), Err(Error::transport("hung call gave up"))),
        };

        tokio::select! {
            biased;
            cause = ctx.done() => {
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                Err(cause)
            }
            () = tokio::time::sleep(delay) => {
                self.completed.fetch_add(1, Ordering::SeqCst);
                result
            }
        }
    }
}

pub type FakeRequestWithValidators = Request<FakeRequest, FakeResponse>;

pub fn request(path: &'static str) -> FakeRequestWithValidators {
    Request::new(FakeRequest {
        path,
        url: format!("http://localhost{path}"),
    })
}

pub fn require_ok(path: &'static str) -> FakeRequestWithValidators {
    request(path).require_status([200])
}

/// Lets tasks woken by a stop signal run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
