//! Tululu-Scraper: a sequential book downloader for the tululu.org catalog
//!
//! This crate fetches book texts, cover images and detail-page metadata for a
//! contiguous range of numeric book ids, treating catalog redirects as
//! "book not found" and retrying transient network failures.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Tracing target for per-book failure events.
///
/// Events on this target go to the error log and are hidden from the console.
pub const FAILURE_LOG_TARGET: &str = "tululu_scraper::failures";

/// Kind of transport-level failure (no HTTP status line was received)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The request or body read timed out
    Timeout,
    /// DNS failure or connection refused/reset while connecting
    Connect,
    /// Any other failure before a complete response was read
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connection failed"),
            Self::Other => write!(f, "transport error"),
        }
    }
}

/// Main error type for Tululu-Scraper operations
#[derive(Debug, Error)]
pub enum TululuError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection error for {url} ({kind}): {message}")]
    Transport {
        url: String,
        kind: TransportKind,
        message: String,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Book not found: {url} was redirected {hops} time(s)")]
    NotFound { url: String, hops: usize },

    #[error("Cannot send request to {url}: {message}")]
    InvalidRequest { url: String, message: String },

    #[error("HTML parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::FetchState,
        to: state::FetchState,
    },

    #[error("Failed to fetch book {book_id} after {attempts} retries.")]
    RetriesExhausted { book_id: u32, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TululuError {
    /// Returns true if the operation that produced this error may be retried
    ///
    /// Only transport failures are retryable; HTTP status, parse and storage
    /// failures are terminal for the book that caused them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Detail page parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    #[error("Missing attribute '{attribute}' on {selector}")]
    MissingAttribute {
        selector: &'static str,
        attribute: &'static str,
    },

    #[error("Malformed header: '{0}'")]
    MalformedHeader(String),

    #[error("Empty {0} in header")]
    EmptyField(&'static str),

    #[error("Invalid cover URL '{0}'")]
    InvalidCoverUrl(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Tululu-Scraper operations
pub type Result<T> = std::result::Result<T, TululuError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{BookFetcher, BookRecord, FetchOutcome, RangeRunner};
pub use state::{FetchState, RangeProgress};
