//! Detail page parser
//!
//! Extracts book metadata from a catalog detail page:
//! - Title and author from the `<h1>` header (`"Title :: Author"`)
//! - Cover image from `div.bookimage img`
//! - Reader comments from `div.texts span`
//! - Genres from the anchors inside the first `span.d_book`

use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Separator between title and author in the page header
pub const HEADER_SEPARATOR: &str = "::";

const HEADER_SELECTOR: &str = "h1";
const COVER_SELECTOR: &str = "div.bookimage img";
const COMMENT_SELECTOR: &str = "div.texts";
const COMMENT_TEXT_SELECTOR: &str = "span";
const GENRE_SELECTOR: &str = "span.d_book";
const GENRE_LINK_SELECTOR: &str = "a";

/// Structured metadata for one book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    /// Absolute cover image URL
    pub cover_url: Url,
    /// Genres in page order
    pub genres: Vec<String>,
    /// Reader comments in page order
    pub comments: Vec<String>,
}

/// Parses a detail page into a `BookRecord`
///
/// The header and cover are required; a page without comments or genres
/// yields empty lists. Relative cover paths are resolved against `base_url`.
///
/// # Example
///
/// ```
/// use tululu_scraper::crawler::parse_detail_page;
/// use url::Url;
///
/// let html = r#"<h1>Алиби :: Иванов</h1>
///     <div class="bookimage"><a href="/b1/"><img src="/shots/1.jpg"></a></div>"#;
/// let base_url = Url::parse("https://tululu.org").unwrap();
/// let record = parse_detail_page(html, &base_url).unwrap();
/// assert_eq!(record.title, "Алиби");
/// assert_eq!(record.cover_url.as_str(), "https://tululu.org/shots/1.jpg");
/// ```
pub fn parse_detail_page(html: &str, base_url: &Url) -> Result<BookRecord, ParseError> {
    let document = Html::parse_document(html);

    let (title, author) = extract_header(&document)?;
    let cover_url = extract_cover_url(&document, base_url)?;
    let comments = extract_comments(&document);
    let genres = extract_genres(&document);

    Ok(BookRecord {
        title,
        author,
        cover_url,
        genres,
        comments,
    })
}

fn selector(css: &'static str) -> Selector {
    // Only called with the constant selectors above, which are valid CSS.
    Selector::parse(css).unwrap_or_else(|_| unreachable!("invalid built-in selector {css}"))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Splits the `<h1>` text into title and author
fn extract_header(document: &Html) -> Result<(String, String), ParseError> {
    let header = document
        .select(&selector(HEADER_SELECTOR))
        .next()
        .ok_or(ParseError::MissingElement(HEADER_SELECTOR))?;

    let text = element_text(header);
    let mut parts = text.split(HEADER_SEPARATOR);

    let (Some(title), Some(author)) = (parts.next(), parts.next()) else {
        return Err(ParseError::MalformedHeader(text.trim().to_string()));
    };

    let title = title.trim();
    let author = author.trim();

    if title.is_empty() {
        return Err(ParseError::EmptyField("title"));
    }
    if author.is_empty() {
        return Err(ParseError::EmptyField("author"));
    }

    Ok((title.to_string(), author.to_string()))
}

/// Resolves the cover `src` to an absolute URL
fn extract_cover_url(document: &Html, base_url: &Url) -> Result<Url, ParseError> {
    let image = document
        .select(&selector(COVER_SELECTOR))
        .next()
        .ok_or(ParseError::MissingElement(COVER_SELECTOR))?;

    let src = image
        .value()
        .attr("src")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingAttribute {
            selector: COVER_SELECTOR,
            attribute: "src",
        })?;

    base_url
        .join(src)
        .map_err(|_| ParseError::InvalidCoverUrl(src.to_string()))
}

fn extract_comments(document: &Html) -> Vec<String> {
    let text_selector = selector(COMMENT_TEXT_SELECTOR);

    document
        .select(&selector(COMMENT_SELECTOR))
        .filter_map(|block| block.select(&text_selector).next())
        .map(element_text)
        .collect()
}

/// Genre links of the first genre block only
fn extract_genres(document: &Html) -> Vec<String> {
    let Some(block) = document.select(&selector(GENRE_SELECTOR)).next() else {
        return Vec::new();
    };

    block
        .select(&selector(GENRE_LINK_SELECTOR))
        .map(element_text)
        .collect()
}
