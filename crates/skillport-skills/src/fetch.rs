//! Bounded HTTP fetching -- the only place that talks to the network.
//!
//! Every request is bounded twice:
//!   - a per-request **timeout** (10 s by default); expiry surfaces as
//!     [`SkillError::Timeout`] naming the URL
//!   - a **size cap** (1 MiB by default); a declared `Content-Length` above
//!     the cap fails before the body is read, and bodies without the header
//!     are cut off as soon as they cross it
//!
//! No retries.  One failed attempt is one error and the caller decides
//! whether the resource was optional.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{Result, SkillError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default response size cap in bytes (1 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 1_048_576;

/// Default maximum number of rule files fetched per skill.
pub const DEFAULT_MAX_RULES: usize = 50;

const USER_AGENT: &str = concat!("skillport/", env!("CARGO_PKG_VERSION"));

/// Bounds applied to remote downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub timeout: Duration,
    pub max_bytes: u64,
    pub max_rules: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
            max_rules: DEFAULT_MAX_RULES,
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub url: String,
    pub status: StatusCode,
    /// Body text.  Empty for non-success statuses.
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-success status into [`SkillError::Fetch`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SkillError::Fetch {
                url: self.url,
                status: self.status.as_u16(),
            })
        }
    }
}

/// Retrieve a URL.  Implementations must enforce their own bounds.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

/// [`Fetch`] over `reqwest` with [`FetchLimits`] applied.
pub struct HttpFetcher {
    client: reqwest::Client,
    limits: FetchLimits,
}

impl HttpFetcher {
    /// Create a fetcher with the default limits.
    pub fn new() -> Self {
        Self::with_limits(FetchLimits::default())
    }

    /// Create a fetcher with custom limits.
    pub fn with_limits(limits: FetchLimits) -> Self {
        Self::from_builder(reqwest::Client::builder(), limits)
    }

    /// Create a fetcher from a partially configured client builder.  The
    /// user agent and the timeout from `limits` are always applied.
    pub fn from_builder(builder: reqwest::ClientBuilder, limits: FetchLimits) -> Self {
        let client = builder
            .user_agent(USER_AGENT)
            .timeout(limits.timeout)
            .build()
            .unwrap_or_default();
        Self { client, limits }
    }

    pub fn limits(&self) -> FetchLimits {
        self.limits
    }

    fn map_err(&self, url: &str, e: reqwest::Error) -> SkillError {
        if e.is_timeout() {
            SkillError::Timeout {
                url: url.to_owned(),
            }
        } else {
            SkillError::Network {
                url: url.to_owned(),
                source: e,
            }
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        debug!(url, "fetching");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_err(url, e))?;

        let limit = self.limits.max_bytes;
        check_declared_size(url, response.content_length(), limit)?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchResponse {
                url: url.to_owned(),
                status,
                body: String::new(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_err(url, e))? {
            let size = (body.len() + chunk.len()) as u64;
            if size > limit {
                return Err(SkillError::ResponseTooLarge {
                    url: url.to_owned(),
                    size,
                    limit,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResponse {
            url: url.to_owned(),
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Reject a response whose declared length exceeds `limit`.
fn check_declared_size(url: &str, declared: Option<u64>, limit: u64) -> Result<()> {
    match declared {
        Some(size) if size > limit => Err(SkillError::ResponseTooLarge {
            url: url.to_owned(),
            size,
            limit,
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
