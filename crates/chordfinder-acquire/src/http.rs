//! Outbound HTTP for all sources.
//!
//! Every request goes out with the same browser user agent and, when
//! configured, the same proxy. Timeouts are per request; there are no
//! retries here.

use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Several tab sites refuse requests that do not look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Environment variable present on PythonAnywhere hosts, whose outbound
/// traffic must go through the site proxy.
pub const PYTHONANYWHERE_MARKER: &str = "PYTHONANYWHERE_SITE";
pub const PYTHONANYWHERE_PROXY: &str = "http://proxy.server:3128";

/// Process-wide fetch settings, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Proxy for both http and https traffic.
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

impl FetchConfig {
    /// Detect the hosting environment and pick a proxy accordingly.
    pub fn from_env() -> Self {
        Self::detect(|key| std::env::var(key).ok())
    }

    fn detect(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let proxy = lookup(PYTHONANYWHERE_MARKER).map(|_| {
            tracing::info!(proxy = PYTHONANYWHERE_PROXY, "Detected PythonAnywhere, routing requests through proxy");
            PYTHONANYWHERE_PROXY.to_string()
        });
        Self {
            proxy,
            ..Self::default()
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        if proxy.is_some() {
            self.proxy = proxy;
        }
        self
    }
}

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub follow_redirects: bool,
    /// Decode the body with this charset, ignoring whatever the response
    /// declares.
    pub charset: Option<&'static str>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout,
            follow_redirects: true,
            charset: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn charset(mut self, charset: &'static str) -> Self {
        self.charset = Some(charset);
        self
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub body: String,
    /// URL of the response after any redirects.
    pub final_url: String,
}

/// Anything that can perform a [`FetchRequest`].
///
/// Sources only talk to the network through this trait, so tests can swap
/// in canned responses.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError>;
}

/// The reqwest-backed fetcher used in production.
pub struct HttpFetcher {
    client: reqwest::Client,
    no_redirect_client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(config, reqwest::redirect::Policy::default())?,
            no_redirect_client: build_client(config, reqwest::redirect::Policy::none())?,
        })
    }
}

fn build_client(
    config: &FetchConfig,
    redirect: reqwest::redirect::Policy,
) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(redirect);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| FetchError::InvalidUrl(format!("proxy {proxy}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| FetchError::Network(e.to_string()))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        let client = if request.follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let forced_encoding = request
            .charset
            .map(|label| {
                encoding_rs::Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| FetchError::UnknownCharset(label.to_string()))
            })
            .transpose()?;

        tracing::debug!(url = %request.url, timeout = ?request.timeout, "GET");

        let mut builder = client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus { code: status.as_u16() });
        }

        let final_url = response.url().to_string();
        // A forced charset wins over both the Content-Type header and any BOM.
        let body = match forced_encoding {
            Some(encoding) => {
                let bytes = response.bytes().await?;
                encoding.decode_without_bom_handling(&bytes).0.into_owned()
            }
            None => response.text().await?,
        };

        tracing::debug!(url = %final_url, bytes = body.len(), "Received body");

        Ok(FetchResult { body, final_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::{IntoResponse, Redirect};
    use axum::routing::get;
    use axum::Router;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "hello" }))
            .route("/agent", get(|headers: axum::http::HeaderMap| async move {
                headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }))
            .route("/echo-header", get(|headers: axum::http::HeaderMap| async move {
                headers
                    .get("x-test")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }))
            .route("/moved", get(|| async { Redirect::temporary("/ok") }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/slow", get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }))
            .route("/latin1", get(|| async {
                // "canción" in ISO-8859-1, served without a charset
                let bytes: Vec<u8> = b"canci\xf3n".to_vec();
                ([(header::CONTENT_TYPE, "text/html")], bytes).into_response()
            }))
            .route("/latin1-as-utf8", get(|| async {
                // Latin-1 bytes behind a header that claims UTF-8
                let bytes: Vec<u8> = b"canci\xf3n".to_vec();
                ([(header::CONTENT_TYPE, "text/html; charset=UTF-8")], bytes).into_response()
            }))
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let base = serve(test_app()).await;
        let result = fetcher()
            .fetch(&FetchRequest::get(format!("{base}/ok"), Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(result.body, "hello");
        assert_eq!(result.final_url, format!("{base}/ok"));
    }

    #[tokio::test]
    async fn test_sends_browser_user_agent() {
        let base = serve(test_app()).await;
        let result = fetcher()
            .fetch(&FetchRequest::get(format!("{base}/agent"), Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(result.body, BROWSER_USER_AGENT);
    }

    #[tokio::test]
    async fn test_sends_extra_headers() {
        let base = serve(test_app()).await;
        let request = FetchRequest::get(format!("{base}/echo-header"), Duration::from_secs(5))
            .header("x-test", "chords");
        let result = fetcher().fetch(&request).await.unwrap();
        assert_eq!(result.body, "chords");
    }

    #[tokio::test]
    async fn test_final_url_after_redirect() {
        let base = serve(test_app()).await;
        let result = fetcher()
            .fetch(&FetchRequest::get(format!("{base}/moved"), Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(result.body, "hello");
        assert_eq!(result.final_url, format!("{base}/ok"));
    }

    #[tokio::test]
    async fn test_redirect_not_followed() {
        let base = serve(test_app()).await;
        let request = FetchRequest::get(format!("{base}/moved"), Duration::from_secs(5))
            .follow_redirects(false);
        let err = fetcher().fetch(&request).await.unwrap_err();
        assert_eq!(err, FetchError::HttpStatus { code: 307 });
    }

    #[tokio::test]
    async fn test_status_error() {
        let base = serve(test_app()).await;
        let err = fetcher()
            .fetch(&FetchRequest::get(format!("{base}/missing"), Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus { code: 404 });
    }

    #[tokio::test]
    async fn test_timeout() {
        let base = serve(test_app()).await;
        let err = fetcher()
            .fetch(&FetchRequest::get(format!("{base}/slow"), Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher()
            .fetch(&FetchRequest::get(format!("http://{addr}/"), Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_latin1_charset_override() {
        let base = serve(test_app()).await;
        let request = FetchRequest::get(format!("{base}/latin1"), Duration::from_secs(5))
            .charset("ISO-8859-1");
        let result = fetcher().fetch(&request).await.unwrap();
        assert_eq!(result.body, "canción");
    }

    #[tokio::test]
    async fn test_charset_override_beats_declared_charset() {
        let base = serve(test_app()).await;
        let request = FetchRequest::get(format!("{base}/latin1-as-utf8"), Duration::from_secs(5))
            .charset("ISO-8859-1");
        let result = fetcher().fetch(&request).await.unwrap();
        assert_eq!(result.body, "canción");
    }

    #[tokio::test]
    async fn test_declared_charset_used_without_override() {
        let base = serve(test_app()).await;
        let request = FetchRequest::get(format!("{base}/latin1-as-utf8"), Duration::from_secs(5));
        let result = fetcher().fetch(&request).await.unwrap();
        assert_eq!(result.body, "canci\u{fffd}n");
    }

    #[tokio::test]
    async fn test_unknown_charset_rejected() {
        let err = fetcher()
            .fetch(&FetchRequest::get("http://127.0.0.1:9/", Duration::from_secs(1)).charset("klingon"))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::UnknownCharset("klingon".into()));
    }

    #[test]
    fn test_detect_pythonanywhere_proxy() {
        let config = FetchConfig::detect(|key| {
            (key == PYTHONANYWHERE_MARKER).then(|| "www.pythonanywhere.com".to_string())
        });
        assert_eq!(config.proxy.as_deref(), Some(PYTHONANYWHERE_PROXY));
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);

        let config = FetchConfig::detect(|_| None);
        assert_eq!(config.proxy, None);
    }

    #[test]
    fn test_explicit_proxy_overrides_detection() {
        let config = FetchConfig::detect(|_| Some("x".into()))
            .with_proxy(Some("http://127.0.0.1:8080".into()));
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:8080"));

        let config = FetchConfig::default().with_proxy(None);
        assert_eq!(config.proxy, None);
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = FetchConfig::default().with_proxy(Some("not a proxy url".into()));
        assert!(matches!(HttpFetcher::new(&config), Err(FetchError::InvalidUrl(_))));
    }
}
