//! Page fetcher abstraction for retrieving upstream responses.

use async_trait::async_trait;

use crate::error::FetchError;

/// Result type for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// How decoded response text is post-processed before it is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextMode {
    /// Escape every `"` as `\"`, then decode HTML entities, so pattern
    /// matching sees literal text. Markup quotes show up as `\"` while
    /// quotes that were entities in the page show up bare.
    #[default]
    Literal,
    /// Return the decoded text untouched. Required for JSON bodies and for
    /// HTML handed to a DOM parser.
    Raw,
}

/// A single outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Form-encoded body. When present the request is a POST.
    pub body: Option<String>,
    pub mode: TextMode,
}

impl FetchRequest {
    /// A GET request returning literal text.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: None,
            mode: TextMode::Literal,
        }
    }

    /// A POST request with a form-encoded body.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: Some(body.into()),
            mode: TextMode::Literal,
        }
    }

    /// Returns the decoded text without the literal-text post-processing.
    pub fn raw(mut self) -> Self {
        self.mode = TextMode::Raw;
        self
    }
}

/// Trait for fetching the text content of a URL.
///
/// Implementations own timeouts, decompression and charset handling;
/// `fetch` is a request-in, text-out interface that never panics.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Performs the request and returns the decoded body.
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<String>;

    /// Convenience for a GET returning literal text.
    async fn get(&self, url: &str) -> FetchResult<String> {
        self.fetch(&FetchRequest::get(url)).await
    }

    /// Convenience for a GET returning raw text.
    async fn get_raw(&self, url: &str) -> FetchResult<String> {
        self.fetch(&FetchRequest::get(url).raw()).await
    }
}

/// Applies the literal-text post-processing described on [`TextMode::Literal`].
pub fn literal_text(text: &str) -> String {
    let escaped = text.replace('"', "\\\"");
    html_escape::decode_html_entities(&escaped).into_owned()
}
