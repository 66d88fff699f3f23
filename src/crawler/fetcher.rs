//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the HTTP client from configuration
//! - GET requests with optional query parameters
//! - Manual redirect following, so every hop is recorded
//! - Classifying transport failures
//! - Decoding bodies with the charset from `Content-Type`
//! - The redirect guard that turns any redirect into "book not found"
//!
//! Non-2xx statuses are returned as ordinary responses; callers decide
//! whether a status is an error. Nothing here retries.

use crate::config::HttpConfig;
use crate::{TransportKind, TululuError};
use encoding_rs::{Encoding, UTF_8};
use mime::Mime;
use reqwest::{header::CONTENT_TYPE, header::LOCATION, redirect::Policy, Client};
use std::borrow::Cow;
use std::time::Duration;
use url::Url;

/// One redirect followed while fetching a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    /// Status code of the redirect response (301, 302, ...)
    pub status: u16,
    /// URL that answered with the redirect
    pub from: String,
    /// Absolute URL the redirect pointed to
    pub location: String,
}

/// A completed HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code of the final response
    pub status: u16,
    /// URL that produced the final response
    pub final_url: Url,
    /// Redirects followed before the final response, in order
    pub redirects: Vec<RedirectHop>,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Encoding named by the `charset` parameter of `Content-Type`
    ///
    /// Falls back to UTF-8 when the header, the parameter or the label is
    /// missing or unknown.
    pub fn encoding(&self) -> &'static Encoding {
        self.content_type
            .as_deref()
            .and_then(|value| value.parse::<Mime>().ok())
            .and_then(|mime| {
                mime.get_param(mime::CHARSET)
                    .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
            })
            .unwrap_or(UTF_8)
    }

    /// Body decoded with the declared charset, replacing invalid sequences
    ///
    /// A byte order mark overrides the declared charset.
    pub fn text(&self) -> Cow<'_, str> {
        let (text, _, _) = self.encoding().decode(&self.body);
        text
    }

    /// Fails with `HttpStatus` unless the status is 2xx
    pub fn error_for_status(self) -> Result<Self, TululuError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TululuError::HttpStatus {
                url: self.final_url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Performs HTTP GET requests
///
/// Implementations must not retry and must not raise on non-2xx statuses.
/// Network failures before a complete response is read are reported as
/// `TululuError::Transport`; requests that cannot be sent at all (bad scheme,
/// invalid header) are `TululuError::InvalidRequest`.
#[allow(async_fn_in_trait)]
pub trait HttpFetcher {
    async fn get(&self, url: &Url, query: &[(&str, String)]) -> Result<HttpResponse, TululuError>;
}

/// Builds an HTTP client with proper configuration
///
/// Automatic redirects are disabled; `ReqwestFetcher` follows them itself.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// `HttpFetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    max_redirects: usize,
}

impl ReqwestFetcher {
    pub fn new(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Builds the client from configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, TululuError> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, config.max_redirects))
    }
}

impl HttpFetcher for ReqwestFetcher {
    /// Fetches a URL, following redirects up to the configured limit
    ///
    /// # Request Flow
    ///
    /// 1. Append query parameters to the URL
    /// 2. Send GET request
    /// 3. On 3xx with a Location header, record the hop and request the target
    /// 4. Read the body of the first non-redirect response
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Timeout, DNS failure, refused/reset connection | `Transport` |
    /// | Body read fails | `Transport` |
    /// | Request cannot be built (e.g. unsupported scheme) | `InvalidRequest` |
    /// | More than `max_redirects` hops | `Ok(HttpResponse)` for the last redirect |
    /// | Any status (including 4xx/5xx) | `Ok(HttpResponse)` |
    async fn get(&self, url: &Url, query: &[(&str, String)]) -> Result<HttpResponse, TululuError> {
        let mut current = url.clone();
        if !query.is_empty() {
            current.query_pairs_mut().extend_pairs(query);
        }

        let mut redirects = Vec::new();

        loop {
            tracing::debug!("GET {}", current);

            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| request_error(&current, e))?;

            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                if let Some(location) = location {
                    let next = current.join(&location)?;
                    tracing::debug!("{} redirected ({}) to {}", current, status, next);
                    redirects.push(RedirectHop {
                        status: status.as_u16(),
                        from: current.to_string(),
                        location: next.to_string(),
                    });

                    if redirects.len() > self.max_redirects {
                        tracing::debug!("Giving up on {} after {} redirects", url, redirects.len());
                        return Ok(HttpResponse {
                            status: status.as_u16(),
                            final_url: current,
                            redirects,
                            content_type: None,
                            body: Vec::new(),
                        });
                    }

                    current = next;
                    continue;
                }
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = response
                .bytes()
                .await
                .map_err(|e| request_error(&current, e))?
                .to_vec();

            return Ok(HttpResponse {
                status: status.as_u16(),
                final_url: current,
                redirects,
                content_type,
                body,
            });
        }
    }
}

/// Classifies a reqwest failure
///
/// Only failures on the wire (timeouts, connect errors, errors while sending
/// or reading the body) are transport errors. Anything raised before a
/// connection is attempted is `InvalidRequest`.
fn request_error(url: &Url, error: reqwest::Error) -> TululuError {
    let kind = if error.is_timeout() {
        TransportKind::Timeout
    } else if error.is_connect() {
        TransportKind::Connect
    } else if error.is_request() || error.is_body() || error.is_decode() {
        TransportKind::Other
    } else {
        return TululuError::InvalidRequest {
            url: url.to_string(),
            message: error.to_string(),
        };
    };

    TululuError::Transport {
        url: url.to_string(),
        kind,
        message: error.to_string(),
    }
}

/// Rejects responses that were redirected
///
/// The catalog answers requests for nonexistent books by redirecting to its
/// home page, so any recorded hop means the book does not exist.
pub fn check_redirect(response: &HttpResponse) -> Result<(), TululuError> {
    match response.redirects.first() {
        Some(first) => Err(TululuError::NotFound {
            url: first.from.clone(),
            hops: response.redirects.len(),
        }),
        None => Ok(()),
    }
}
