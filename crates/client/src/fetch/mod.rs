//! HTTP fetch adapter for the cache manager.
//!
//! ### Semantics
//! - Relative paths resolve against the app origin; URLs are canonicalized
//!   (lowercase host, no fragment, query preserved).
//! - Any HTTP status resolves. Only transport failures reject: DNS, connect,
//!   timeout, body read, or a body over `max_bytes`.
//! - A response whose final URL shares the app origin is `basic`; anything
//!   else is `cors`.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize, resolve};

use shellcache_core::{AppConfig, AssetResponse, Error, Request, ResponseType};

/// Source of network responses for intercepted requests.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. Resolves for every HTTP status; rejects on
    /// transport failure.
    async fn fetch(&self, request: &Request) -> Result<AssetResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin of the app shell.
    pub origin: Url,

    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Self::new(origin)
        })
    }
}

/// Map a reqwest failure onto the error taxonomy.
fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() { Error::FetchTimeout(err.to_string()) } else { Error::Network(err.to_string()) }
}

/// HTTP fetch client bound to one app origin.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Resolve a path or absolute URL against the app origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.config.origin, input).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn response_type(&self, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.config.origin.origin() { ResponseType::Basic } else { ResponseType::Cors }
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<AssetResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid HTTP method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = header_pairs(response.headers());

        let body = response.bytes().await.map_err(transport_error)?;
        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(AssetResponse {
            url: final_url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            response_type: self.response_type(&final_url),
            headers,
            body,
        })
    }
}

/// Header map as ordered pairs, skipping values that are not valid UTF-8.
fn header_pairs(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}
