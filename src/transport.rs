use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::io::Read;
use std::time::Duration;

use crate::error::{Error, Result};

/// What a transport hands back for one GET.
pub struct TransportResponse {
    pub status: StatusCode,
    /// Body length when the server announced one.
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    /// A response with an in-memory body, mostly useful for test transports.
    pub fn from_bytes(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            status,
            content_length: Some(body.len() as u64),
            body: Box::new(std::io::Cursor::new(body)),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// The single HTTP capability the client needs: GET an absolute URL.
///
/// Retries, pooling and timeouts belong to the implementation. Any
/// `Fn(&str) -> Result<TransportResponse>` closure is a transport.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<TransportResponse>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> Result<TransportResponse> + Send + Sync,
{
    fn get(&self, url: &str) -> Result<TransportResponse> {
        self(url)
    }
}

/// Default transport backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(verify: bool) -> Result<Self> {
        Self::with_timeout(verify, Duration::from_secs(60))
    }

    pub fn with_timeout(verify: bool, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("weatherlink-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("weatherlink-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout);

        if !verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(Error::transport)?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<TransportResponse> {
        let resp = self.http.get(url).send().map_err(Error::transport)?;
        Ok(TransportResponse {
            status: resp.status(),
            content_length: resp.content_length(),
            body: Box::new(resp),
        })
    }
}
