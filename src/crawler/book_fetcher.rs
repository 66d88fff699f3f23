//! Per-book fetch pipeline with bounded retries
//!
//! For one book id this module downloads the text, the detail page and the
//! cover, parses the metadata, and writes the artifacts. Transport failures
//! restart the whole attempt after a fixed pause; everything else is terminal
//! for the id.

use crate::config::{Config, RetryConfig};
use crate::crawler::fetcher::{check_redirect, HttpFetcher, HttpResponse, ReqwestFetcher};
use crate::crawler::parser::{parse_detail_page, BookRecord};
use crate::state::FetchState;
use crate::storage::{ArtifactPaths, ArtifactStore};
use crate::{TululuError, FAILURE_LOG_TARGET};
use std::time::Duration;
use url::Url;

/// Result of processing one book id
#[derive(Debug)]
pub enum FetchOutcome {
    /// Book downloaded and written to disk
    Success {
        book_id: u32,
        record: BookRecord,
        artifacts: ArtifactPaths,
    },

    /// The catalog redirected a request, so the book does not exist
    NotFound {
        book_id: u32,
        /// The request that was redirected
        url: String,
    },

    /// Terminal, non-retried failure (HTTP status, parse, storage, ...)
    Failed { book_id: u32, error: TululuError },

    /// Every attempt ended in a transport failure
    RetriesExhausted { book_id: u32, attempts: u32 },
}

impl FetchOutcome {
    pub fn book_id(&self) -> u32 {
        match self {
            Self::Success { book_id, .. }
            | Self::NotFound { book_id, .. }
            | Self::Failed { book_id, .. }
            | Self::RetriesExhausted { book_id, .. } => *book_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Fixed-count, fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }
}

/// Catalog URLs derived from configuration
#[derive(Debug, Clone)]
pub struct CatalogUrls {
    base: Url,
    content: Url,
    detail_template: String,
}

impl CatalogUrls {
    pub fn new(base_url: &str, content_path: &str, detail_template: &str) -> crate::Result<Self> {
        let base = Url::parse(base_url)?;
        let content = base.join(content_path)?;
        Ok(Self {
            base,
            content,
            detail_template: detail_template.to_string(),
        })
    }

    /// Base URL used to resolve relative cover paths
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Text download endpoint; the id goes in the query string
    pub fn content(&self) -> &Url {
        &self.content
    }

    /// Detail page URL for `book_id`
    pub fn detail(&self, book_id: u32) -> crate::Result<Url> {
        let path = self.detail_template.replace("{id}", &book_id.to_string());
        Ok(self.base.join(&path)?)
    }
}

/// Downloads single books, retrying transport failures
///
/// The retry budget is local to each `fetch_one` call, so one book's failures
/// never reduce the attempts available to the next.
pub struct BookFetcher<F = ReqwestFetcher> {
    fetcher: F,
    urls: CatalogUrls,
    store: ArtifactStore,
    retry: RetryPolicy,
}

impl BookFetcher<ReqwestFetcher> {
    /// Builds a fetcher with a reqwest client from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let fetcher = ReqwestFetcher::from_config(&config.http)?;
        let urls = CatalogUrls::new(
            &config.catalog.base_url,
            &config.catalog.content_path,
            &config.catalog.detail_path,
        )?;
        let store = ArtifactStore::new(&config.output.books_dir, &config.output.images_dir);
        Ok(Self::new(fetcher, urls, store, RetryPolicy::from(&config.retry)))
    }
}

impl<F: HttpFetcher> BookFetcher<F> {
    pub fn new(fetcher: F, urls: CatalogUrls, store: ArtifactStore, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            urls,
            store,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Processes one book id
    ///
    /// Only `TululuError::Transport` is retried, up to `max_attempts` total
    /// attempts with `delay` between them. A redirect on any catalog request
    /// yields `NotFound`; other errors yield `Failed` immediately.
    pub async fn fetch_one(&self, book_id: u32) -> FetchOutcome {
        let max_attempts = self.retry.max_attempts;

        let mut state = FetchState::Init;

        for attempt in 1..=max_attempts {
            let error = match self.attempt(book_id, &mut state).await {
                Ok((record, artifacts)) => {
                    tracing::info!(book_id, title = %record.title, "Downloaded book");
                    return FetchOutcome::Success {
                        book_id,
                        record,
                        artifacts,
                    };
                }
                Err(error) => error,
            };

            match error {
                TululuError::NotFound { url, hops } => {
                    tracing::warn!(
                        target: FAILURE_LOG_TARGET,
                        book_id,
                        "Book {} not found: {} was redirected {} time(s)",
                        book_id,
                        url,
                        hops
                    );
                    return settle(
                        book_id,
                        &mut state,
                        FetchState::NotFound,
                        FetchOutcome::NotFound { book_id, url },
                    );
                }
                error if error.is_retryable() => {
                    if attempt < max_attempts {
                        tracing::error!(
                            target: FAILURE_LOG_TARGET,
                            book_id,
                            attempt,
                            "Connection error: {}. Retrying in {:?}",
                            error,
                            self.retry.delay
                        );
                        tokio::time::sleep(self.retry.delay).await;
                        state = FetchState::Init;
                    } else {
                        tracing::error!(
                            target: FAILURE_LOG_TARGET,
                            book_id,
                            attempt,
                            "Connection error: {}. No attempts left",
                            error
                        );
                    }
                }
                error => {
                    tracing::error!(
                        target: FAILURE_LOG_TARGET,
                        book_id,
                        state = %state,
                        "Error fetching book {}: {}",
                        book_id,
                        error
                    );
                    return FetchOutcome::Failed { book_id, error };
                }
            }
        }

        tracing::error!(
            target: FAILURE_LOG_TARGET,
            book_id,
            "Failed to fetch book {} after {} retries.",
            book_id,
            max_attempts
        );
        settle(
            book_id,
            &mut state,
            FetchState::Exhausted,
            FetchOutcome::RetriesExhausted {
                book_id,
                attempts: max_attempts,
            },
        )
    }

    /// Runs the pipeline once, without retrying
    ///
    /// `state` is left at the last step that completed, so the caller can
    /// move it into a failure exit.
    async fn attempt(
        &self,
        book_id: u32,
        state: &mut FetchState,
    ) -> crate::Result<(BookRecord, ArtifactPaths)> {
        let content = self
            .fetch_catalog_page(self.urls.content(), &[("id", book_id.to_string())])
            .await?;
        state.advance(FetchState::ContentFetched)?;

        let detail_url = self.urls.detail(book_id)?;
        let detail = self.fetch_catalog_page(&detail_url, &[]).await?;
        state.advance(FetchState::DetailFetched)?;

        // Detail pages are decoded with their declared charset; the text body
        // is written as raw bytes.
        let record = parse_detail_page(&detail.text(), self.urls.base())?;
        state.advance(FetchState::Parsed)?;

        // Cover is downloaded before anything is written, so a failed
        // attempt leaves no files behind.
        let cover = self
            .fetcher
            .get(&record.cover_url, &[])
            .await?
            .error_for_status()?;

        let text = self.store.write_text(&record, &content.body)?;
        let image = self
            .store
            .write_image(&record, &cover.body, &record.cover_url)?;
        state.advance(FetchState::Stored)?;

        state.advance(FetchState::Done)?;
        Ok((record, ArtifactPaths { text, image }))
    }

    /// GETs a catalog page, treating redirects as "not found"
    async fn fetch_catalog_page(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> crate::Result<HttpResponse> {
        let response = self.fetcher.get(url, query).await?;
        check_redirect(&response)?;
        response.error_for_status()
    }
}

/// Moves `state` into the terminal `exit` and returns `outcome`
fn settle(
    book_id: u32,
    state: &mut FetchState,
    exit: FetchState,
    outcome: FetchOutcome,
) -> FetchOutcome {
    match state.advance(exit) {
        Ok(()) => {
            debug_assert!(state.is_terminal());
            outcome
        }
        Err(error) => FetchOutcome::Failed { book_id, error },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::RedirectHop;
    use crate::TransportKind;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    const DETAIL_PAGE: &str = r#"<html><body>
        <h1>Test Book :: Test Author</h1>
        <div class="bookimage"><img src="/shots/7.jpg"></div>
        <span class="d_book"><a href="/l1/">Fantasy</a></span>
        </body></html>"#;

    enum Scripted {
        Ok(u16, &'static str),
        Redirect,
        Transport,
    }

    /// Replays scripted responses and records every requested URL
    struct ScriptedFetcher {
        script: RefCell<VecDeque<Scripted>>,
        requests: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Scripted>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpFetcher for ScriptedFetcher {
        async fn get(
            &self,
            url: &Url,
            query: &[(&str, String)],
        ) -> Result<HttpResponse, TululuError> {
            let mut full = url.clone();
            if !query.is_empty() {
                full.query_pairs_mut().extend_pairs(query);
            }
            self.requests.borrow_mut().push(full.to_string());

            let next = self
                .script
                .borrow_mut()
                .pop_front()
                .expect("script exhausted");

            match next {
                Scripted::Ok(status, body) => Ok(HttpResponse {
                    status,
                    final_url: full,
                    redirects: vec![],
                    content_type: None,
                    body: body.as_bytes().to_vec(),
                }),
                Scripted::Redirect => Ok(HttpResponse {
                    status: 200,
                    final_url: Url::parse("https://tululu.org/").unwrap(),
                    redirects: vec![RedirectHop {
                        status: 302,
                        from: full.to_string(),
                        location: "https://tululu.org/".to_string(),
                    }],
                    content_type: None,
                    body: Vec::new(),
                }),
                Scripted::Transport => Err(TululuError::Transport {
                    url: full.to_string(),
                    kind: TransportKind::Connect,
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn book_fetcher(
        script: Vec<Scripted>,
        root: &TempDir,
        delay: Duration,
    ) -> BookFetcher<ScriptedFetcher> {
        let urls = CatalogUrls::new("https://tululu.org", "txt.php", "b{id}/").unwrap();
        let store = ArtifactStore::new(root.path().join("books"), root.path().join("images"));
        BookFetcher::new(
            ScriptedFetcher::new(script),
            urls,
            store,
            RetryPolicy::new(3, delay),
        )
    }

    fn success_script() -> Vec<Scripted> {
        vec![
            Scripted::Ok(200, "book text"),
            Scripted::Ok(200, DETAIL_PAGE),
            Scripted::Ok(200, "jpeg bytes"),
        ]
    }

    #[test]
    fn test_catalog_urls() {
        let urls = CatalogUrls::new("https://tululu.org", "txt.php", "b{id}/").unwrap();
        assert_eq!(urls.content().as_str(), "https://tululu.org/txt.php");
        assert_eq!(urls.detail(42).unwrap().as_str(), "https://tululu.org/b42/");
    }

    #[test]
    fn test_retry_policy_has_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_writes_artifacts() {
        let root = TempDir::new().unwrap();
        let fetcher = book_fetcher(success_script(), &root, Duration::ZERO);

        let outcome = fetcher.fetch_one(7).await;

        let (book_id, record, artifacts) = match outcome {
            FetchOutcome::Success {
                book_id,
                record,
                artifacts,
            } => (book_id, record, artifacts),
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(book_id, 7);
        assert_eq!(record.title, "Test Book");
        assert_eq!(record.author, "Test Author");
        assert_eq!(record.genres, vec!["Fantasy"]);
        assert_eq!(std::fs::read(&artifacts.text).unwrap(), b"book text");
        assert_eq!(artifacts.image.file_name().unwrap(), "Test Book.jpg");

        let requests = fetcher.fetcher.requests.borrow();
        assert_eq!(
            *requests,
            vec![
                "https://tululu.org/txt.php?id=7",
                "https://tululu.org/b7/",
                "https://tululu.org/shots/7.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_content_redirect_skips_detail_page() {
        let root = TempDir::new().unwrap();
        let fetcher = book_fetcher(vec![Scripted::Redirect], &root, Duration::ZERO);

        let outcome = fetcher.fetch_one(3).await;

        assert!(matches!(outcome, FetchOutcome::NotFound { book_id: 3, .. }));
        assert_eq!(fetcher.fetcher.requests.borrow().len(), 1);
        assert!(!root.path().join("books").exists());
    }

    #[tokio::test]
    async fn test_detail_redirect_is_not_found() {
        let root = TempDir::new().unwrap();
        let fetcher = book_fetcher(
            vec![Scripted::Ok(200, "text"), Scripted::Redirect],
            &root,
            Duration::ZERO,
        );

        let outcome = fetcher.fetch_one(3).await;

        match outcome {
            FetchOutcome::NotFound { url, .. } => assert_eq!(url, "https://tululu.org/b3/"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(!root.path().join("books").exists());
        assert!(!root.path().join("images").exists());
    }

    #[tokio::test]
    async fn test_three_transport_errors_exhaust_retries() {
        let root = TempDir::new().unwrap();
        let delay = Duration::from_millis(20);
        let fetcher = book_fetcher(
            vec![Scripted::Transport, Scripted::Transport, Scripted::Transport],
            &root,
            delay,
        );

        let started = std::time::Instant::now();
        let outcome = fetcher.fetch_one(5).await;

        assert!(matches!(
            outcome,
            FetchOutcome::RetriesExhausted {
                book_id: 5,
                attempts: 3
            }
        ));
        assert_eq!(fetcher.fetcher.requests.borrow().len(), 3);
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_cover_transport_errors_exhaust_retries() {
        let root = TempDir::new().unwrap();
        let mut script = Vec::new();
        for _ in 0..3 {
            script.extend([
                Scripted::Ok(200, "text"),
                Scripted::Ok(200, DETAIL_PAGE),
                Scripted::Transport,
            ]);
        }
        let fetcher = book_fetcher(script, &root, Duration::ZERO);

        let outcome = fetcher.fetch_one(6).await;

        assert!(
            matches!(outcome, FetchOutcome::RetriesExhausted { book_id: 6, attempts: 3 }),
            "got {outcome:?}"
        );
        assert_eq!(fetcher.fetcher.requests.borrow().len(), 9);
        assert!(!root.path().join("books").exists());
    }

    #[test]
    fn test_settle_moves_to_exit_state() {
        let mut state = FetchState::ContentFetched;
        let outcome = settle(
            2,
            &mut state,
            FetchState::NotFound,
            FetchOutcome::NotFound {
                book_id: 2,
                url: "https://tululu.org/b2/".to_string(),
            },
        );

        assert!(matches!(outcome, FetchOutcome::NotFound { book_id: 2, .. }));
        assert_eq!(state, FetchState::NotFound);
    }

    #[test]
    fn test_settle_rejects_exit_after_store() {
        let mut state = FetchState::Stored;
        let outcome = settle(
            2,
            &mut state,
            FetchState::Exhausted,
            FetchOutcome::RetriesExhausted {
                book_id: 2,
                attempts: 3,
            },
        );

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                book_id: 2,
                error: TululuError::InvalidTransition { .. }
            }
        ));
        assert_eq!(state, FetchState::Stored);
    }

    #[tokio::test]
    async fn test_transport_error_then_success() {
        let root = TempDir::new().unwrap();
        let mut script = vec![Scripted::Ok(200, "text"), Scripted::Transport];
        script.extend(success_script());
        let fetcher = book_fetcher(script, &root, Duration::ZERO);

        let outcome = fetcher.fetch_one(1).await;

        assert!(outcome.is_success());
        assert_eq!(fetcher.fetcher.requests.borrow().len(), 5);
    }

    #[tokio::test]
    async fn test_retry_budget_resets_per_book() {
        let root = TempDir::new().unwrap();
        let mut script = vec![Scripted::Transport, Scripted::Transport, Scripted::Transport];
        script.extend([Scripted::Transport, Scripted::Transport]);
        script.extend(success_script());
        let fetcher = book_fetcher(script, &root, Duration::ZERO);

        let first = fetcher.fetch_one(1).await;
        let second = fetcher.fetch_one(2).await;

        assert!(matches!(first, FetchOutcome::RetriesExhausted { .. }));
        assert!(second.is_success(), "got {second:?}");
    }

    #[tokio::test]
    async fn test_http_status_is_not_retried() {
        let root = TempDir::new().unwrap();
        let fetcher = book_fetcher(vec![Scripted::Ok(500, "oops")], &root, Duration::ZERO);

        let outcome = fetcher.fetch_one(9).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                book_id: 9,
                error: TululuError::HttpStatus { status: 500, .. }
            }
        ));
        assert_eq!(fetcher.fetcher.requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_writes_nothing() {
        let root = TempDir::new().unwrap();
        let fetcher = book_fetcher(
            vec![
                Scripted::Ok(200, "text"),
                Scripted::Ok(200, r#"<h1>No separator</h1><div class="bookimage"><img src="/x.jpg"></div>"#),
            ],
            &root,
            Duration::ZERO,
        );

        let outcome = fetcher.fetch_one(4).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                error: TululuError::Parse(crate::ParseError::MalformedHeader(_)),
                ..
            }
        ));
        assert_eq!(fetcher.fetcher.requests.borrow().len(), 2);
        assert!(!root.path().join("books").exists());
    }

    #[tokio::test]
    async fn test_cover_status_error_writes_nothing() {
        let root = TempDir::new().unwrap();
        let fetcher = book_fetcher(
            vec![
                Scripted::Ok(200, "text"),
                Scripted::Ok(200, DETAIL_PAGE),
                Scripted::Ok(404, ""),
            ],
            &root,
            Duration::ZERO,
        );

        let outcome = fetcher.fetch_one(4).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                error: TululuError::HttpStatus { status: 404, .. },
                ..
            }
        ));
        assert!(!root.path().join("books").exists());
    }
}
