//! HTTP-based page fetcher using reqwest.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use flate2::read::GzDecoder;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::fetcher::{literal_text, FetchRequest, FetchResult, PageFetcher, TextMode};

/// Browser user agent sent with every request; several sites reject
/// unbranded clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36";

/// Default connect + read timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A page fetcher that uses plain HTTP requests via reqwest.
///
/// Bodies starting with the gzip magic bytes are decompressed whatever the
/// declared encoding, and text is decoded using the `charset=` parameter of
/// `Content-Type` (UTF-8 otherwise) with lossy replacement.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::ConnectionFailed(format!("failed to build client: {}", e)))?;
        Ok(Self { client })
    }

    /// Creates a fetcher with the default timeout and browser user agent.
    pub fn with_defaults() -> FetchResult<Self> {
        Self::new(DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<String> {
        let builder = match &request.body {
            Some(body) => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.clone()),
            None => self.client.get(&request.url),
        };

        let response = builder.send().await.map_err(|e| {
            debug!("Request to {} failed: {}", request.url, e);
            FetchError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Request to {} returned {}", request.url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = response.bytes().await?;
        let bytes = decompress(&bytes)?;
        let text = decode_text(&bytes, charset.as_deref());

        Ok(match request.mode {
            TextMode::Literal => literal_text(&text),
            TextMode::Raw => text,
        })
    }
}

/// Extracts the `charset=` parameter from a `Content-Type` value.
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Gunzips the body if it starts with the gzip magic bytes.
fn decompress(bytes: &[u8]) -> FetchResult<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }
    let mut decoded = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .map_err(|e| FetchError::Decode(format!("gzip: {}", e)))?;
    Ok(decoded)
}

/// Decodes bytes in the named charset, falling back to UTF-8 for unknown
/// labels. Malformed sequences are replaced, never rejected.
fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_millis(500), DEFAULT_USER_AGENT).unwrap()
    }

    #[test]
    fn test_http_fetcher_with_defaults() {
        assert_ok!(HttpFetcher::with_defaults());
    }

    #[test]
    fn test_http_fetcher_with_client() {
        let client = Client::builder().user_agent("test-agent").build().unwrap();
        let _fetcher = HttpFetcher::with_client(client);
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=ISO-8859-1"),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(
            charset_from_content_type("text/html;Charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_from_content_type("text/html"), None);
        assert_eq!(charset_from_content_type("text/html; charset="), None);
    }

    #[test]
    fn test_decode_text_fallbacks() {
        assert_eq!(decode_text(b"caf\xc3\xa9", None), "café");
        assert_eq!(decode_text(b"caf\xe9", Some("latin1")), "café");
        assert_eq!(decode_text(b"ok", Some("no-such-charset")), "ok");
        assert_eq!(decode_text(b"bad\xff", None), "bad\u{fffd}");
    }

    #[test]
    fn test_decompress() {
        assert_eq!(decompress(b"plain").unwrap(), b"plain");
        assert_eq!(decompress(&gzip(b"zipped")).unwrap(), b"zipped");
        assert!(matches!(
            decompress(&[0x1f, 0x8b, 0x00]),
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ua"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let text = fetcher().get(&format!("{}/ua", server.uri())).await;
        assert_eq!(text, Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_sniffs_mislabeled_gzip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(gzip(b"[{\"name\":\"x\"}]"), "application/json"),
            )
            .mount(&server)
            .await;

        let text = fetcher().get_raw(&format!("{}/gz", server.uri())).await;
        assert_eq!(text, Ok("[{\"name\":\"x\"}]".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_uses_declared_charset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"Am\xe9lie".to_vec(), "text/html; charset=ISO-8859-1"),
            )
            .mount(&server)
            .await;

        let text = fetcher().get(&format!("{}/latin", server.uri())).await;
        assert_eq!(text, Ok("Amélie".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_literal_mode_post_processing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"<a href="/x?a=1&amp;b=2">A &amp; B</a>"#, "text/html"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let literal = fetcher().get(&url).await.unwrap();
        assert_eq!(literal, r#"<a href=\"/x?a=1&b=2\">A & B</a>"#);
        let raw = fetcher().get_raw(&url).await.unwrap();
        assert_eq!(raw, r#"<a href="/x?a=1&amp;b=2">A &amp; B</a>"#);
    }

    #[tokio::test]
    async fn test_fetch_post_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/form"))
            .and(body_string("q=ubuntu"))
            .respond_with(ResponseTemplate::new(200).set_body_string("posted"))
            .mount(&server)
            .await;

        let request = FetchRequest::post(format!("{}/form", server.uri()), "q=ubuntu");
        assert_eq!(fetcher().fetch(&request).await, Ok("posted".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = fetcher().get(&server.uri()).await;
        assert_eq!(result, Err(FetchError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_maps_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let result = fetcher().get(&server.uri()).await;
        assert_eq!(result, Err(FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let result = fetcher().get("http://127.0.0.1:1/").await;
        assert!(matches!(result, Err(FetchError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        assert_err!(fetcher().get("not a url").await);
    }
}
