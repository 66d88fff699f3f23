use serde::Deserialize;

/// Main configuration structure for Tululu-Scraper
///
/// Every section is optional; missing keys fall back to the defaults used
/// against the live catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
}

/// Catalog endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog, also used to resolve relative cover paths
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the text download endpoint (takes an `id` query parameter)
    #[serde(rename = "content-path")]
    pub content_path: String,

    /// Detail page path template; `{id}` is replaced with the book id
    #[serde(rename = "detail-path")]
    pub detail_path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tululu.org".to_string(),
            content_path: "txt.php".to_string(),
            detail_path: "b{id}/".to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of redirect hops followed before giving up
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("tululu-scraper/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// Retry policy for transport failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per book, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2000,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(rename = "books-dir")]
    pub books_dir: String,

    #[serde(rename = "images-dir")]
    pub images_dir: String,

    /// Append-only log of per-book failures
    #[serde(rename = "error-log")]
    pub error_log: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            books_dir: "books".to_string(),
            images_dir: "images".to_string(),
            error_log: "error.log".to_string(),
        }
    }
}

/// Run-level behavior
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(rename = "on-exhausted")]
    pub on_exhausted: ExhaustionPolicy,
}

/// What the range runner does when a book exhausts its retries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Stop the whole run and report failure
    #[default]
    Abort,
    /// Record the book as failed and move on to the next id
    Continue,
}
