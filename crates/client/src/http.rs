//! Shared HTTP plumbing for every collaborator call.
//!
//! `HttpClient` wraps a blocking reqwest client with a per-request timeout,
//! optional bearer auth, retry with exponential backoff and status
//! classification:
//! - 401/403: `FetchError::Auth`, never retried
//! - 404: `FetchError::NotFound`, never retried
//! - other 4xx except 429: `FetchError::Rejected`, never retried
//! - 429 and 5xx: retried, honoring `Retry-After` on 429 up to the
//!   request timeout
//! - connect errors and timeouts: retried

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::FetchError;

// ── Constants ───────────────────────────────────────────────────────

pub const MAX_RETRIES: u32 = 3;
pub const USER_AGENT: &str = concat!("stridebook/", env!("CARGO_PKG_VERSION"));

// ── Retry policy ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// First backoff; doubled after every retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }
}

// ── HttpClient ──────────────────────────────────────────────────────

pub struct HttpClient {
    http: Client,
    /// Per-attempt timeout; also the longest `Retry-After` wait honoured.
    timeout: Duration,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, token: Option<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            timeout,
            token: token.filter(|t| !t.trim().is_empty()),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Idempotent call: retried per the client's policy.
    ///
    /// `build_request` is called once per attempt and must return a fully
    /// configured `RequestBuilder` (URL, method, body, query).
    pub fn send_json(
        &self,
        endpoint: &str,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Value, FetchError> {
        self.send(endpoint, self.retry, build_request)
    }

    /// Non-idempotent call (ledger create): exactly one attempt.
    pub fn send_json_once(
        &self,
        endpoint: &str,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Value, FetchError> {
        self.send(endpoint, RetryPolicy::none(), build_request)
    }

    fn send(
        &self,
        endpoint: &str,
        policy: RetryPolicy,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Value, FetchError> {
        let mut backoff = policy.initial_backoff;
        let attempts = policy.max_retries + 1;

        for attempt in 0..=policy.max_retries {
            let mut req = build_request(&self.http);
            if let Some(ref token) = self.token {
                req = req.bearer_auth(token);
            }

            match req.send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if status == 401 || status == 403 {
                        return Err(FetchError::Auth {
                            endpoint: endpoint.to_string(),
                            status,
                            message: error_message(resp),
                        });
                    }

                    if status == 404 {
                        return Err(FetchError::NotFound {
                            endpoint: endpoint.to_string(),
                        });
                    }

                    if (400..500).contains(&status) && status != 429 {
                        return Err(FetchError::Rejected {
                            endpoint: endpoint.to_string(),
                            status,
                            message: error_message(resp),
                        });
                    }

                    if status == 429 || status >= 500 {
                        if attempt == policy.max_retries {
                            return Err(if status == 429 {
                                FetchError::RateLimited {
                                    endpoint: endpoint.to_string(),
                                    attempts,
                                }
                            } else {
                                FetchError::Upstream {
                                    endpoint: endpoint.to_string(),
                                    status,
                                    attempts,
                                }
                            });
                        }

                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or(backoff)
                                .min(self.timeout)
                        } else {
                            backoff
                        };

                        tracing::warn!(
                            endpoint,
                            status,
                            retry = attempt + 1,
                            of = policy.max_retries,
                            wait_ms = wait.as_millis() as u64,
                            "retrying"
                        );
                        thread::sleep(wait);
                        backoff *= 2;
                        continue;
                    }

                    return parse_body(endpoint, resp);
                }
                Err(e) => {
                    if attempt == policy.max_retries {
                        return Err(FetchError::Transport {
                            endpoint: endpoint.to_string(),
                            attempts,
                            message: e.to_string(),
                        });
                    }

                    tracing::warn!(
                        endpoint,
                        retry = attempt + 1,
                        of = policy.max_retries,
                        error = %e,
                        "retrying"
                    );
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        // The loop always returns on its last attempt.
        Err(FetchError::Transport {
            endpoint: endpoint.to_string(),
            attempts,
            message: "retry budget exhausted".into(),
        })
    }
}

/// Success body as JSON. Empty bodies (bare 204/200 acks) read as null;
/// a leading BOM is tolerated.
fn parse_body(endpoint: &str, resp: reqwest::blocking::Response) -> Result<Value, FetchError> {
    let text = resp.text().map_err(|e| FetchError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|e| FetchError::Decode {
        endpoint: endpoint.to_string(),
        message: format!("{e} (body: {})", truncate(trimmed, 200)),
    })
}

/// Best-effort error text from a failed response.
fn error_message(resp: reqwest::blocking::Response) -> String {
    let status = resp.status().as_u16();
    let body: Value = resp.json().unwrap_or(Value::Null);
    ["message", "error", "detail"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
