//! HTTP transport and the per-run response cache.
//!
//! [`Transport`] is the seam between the checks and the network: production
//! code uses [`HttpTransport`] (a blocking reqwest client), tests substitute a
//! counting fake. [`MemoizedCaller`] sits in front of a transport and makes
//! sure each distinct `(url, token)` pair hits the network at most once per run.

use crate::error::Result;
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Status code and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
}

impl HttpResponse {
    /// Creates a response from a status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Issues a single GET request.
pub trait Transport {
    /// GETs `url`, sending `Authorization: Bearer <token>` when a token is given.
    fn get(&self, url: &Url, token: Option<&str>) -> Result<HttpResponse>;
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cwds-smoke/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url, token: Option<&str>) -> Result<HttpResponse> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(%url, status, authenticated = token.is_some(), "GET");

        Ok(HttpResponse { status, body })
    }
}

type CacheKey = (String, Option<String>);

/// Process-lifetime cache of GET responses keyed by `(url, token)`.
///
/// Entries never expire. Failed calls are not cached, so a transport error
/// is retried the next time the same pair is requested.
pub struct MemoizedCaller<'t> {
    transport: &'t dyn Transport,
    cache: RefCell<HashMap<CacheKey, Rc<HttpResponse>>>,
}

impl<'t> MemoizedCaller<'t> {
    /// Creates an empty cache in front of `transport`.
    pub fn new(transport: &'t dyn Transport) -> Self {
        Self {
            transport,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the cached response for `(url, token)`, fetching it on first use.
    pub fn get_or_fetch(&self, url: &Url, token: Option<&str>) -> Result<Rc<HttpResponse>> {
        let key = (url.as_str().to_string(), token.map(str::to_string));

        if let Some(hit) = self.cache.borrow().get(&key) {
            debug!(%url, "response cache hit");
            return Ok(Rc::clone(hit));
        }

        let response = Rc::new(self.transport.get(url, token)?);
        self.cache.borrow_mut().insert(key, Rc::clone(&response));
        Ok(response)
    }

    /// The uncached transport, for calls that must not be memoized.
    pub fn transport(&self) -> &'t dyn Transport {
        self.transport
    }

    /// Number of distinct `(url, token)` pairs cached so far.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}
