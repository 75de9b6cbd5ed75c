use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::load_config;
use crate::error::{Error, Result};
use crate::models::{CurrentResponse, HistoricResponse, SensorsResponse, StationsResponse};
use crate::request::{Endpoint, build_url};
use crate::signature::{KEY_PARAM, SignatureParams, TIMESTAMP_PARAM};
use crate::transport::{HttpTransport, Transport, TransportResponse};
use crate::util::unix_now;

#[derive(Clone)]
pub struct ClientConfig {
    /// API key, sent in every request.
    pub key: String,
    /// API secret. Only used to derive signatures, never transmitted.
    pub secret: String,
    /// Whether the default transport verifies TLS certificates.
    pub verify: bool,
}

impl ClientConfig {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            verify: true,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("verify", &self.verify)
            .finish()
    }
}

/// A WeatherLink v2 client.
///
/// Credentials are fixed at construction. Every call signs a fresh
/// parameter set with its own timestamp, so a client can be shared
/// between threads.
#[derive(Clone)]
pub struct Client {
    key: String,
    secret: String,
    progress: bool,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("key", &self.key)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client over the default HTTP transport.
    ///
    /// Fails with [`Error::Config`] if the key or secret is empty.
    pub fn new(config: ClientConfig) -> Result<Self> {
        validate(&config)?;
        let transport = HttpTransport::new(config.verify)?;
        Self::with_transport(config, transport)
    }

    /// Creates a client that sends its requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        validate(&config)?;
        Ok(Self {
            key: config.key,
            secret: config.secret,
            progress: false,
            transport: Arc::new(transport),
        })
    }

    /// Creates a client from environment variables and/or `.weatherlinkrc`.
    ///
    /// This is equivalent to `Client::load(None, None, None)`.
    pub fn from_env() -> Result<Self> {
        Self::load(None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `key`/`secret` arguments
    /// - environment variables `WEATHERLINK_API_KEY` / `WEATHERLINK_API_SECRET`
    /// - config file from `WEATHERLINK_RC` or `.weatherlinkrc`
    pub fn load(key: Option<String>, secret: Option<String>, verify: Option<bool>) -> Result<Self> {
        Self::new(load_config(key, secret, verify)?)
    }

    /// Show a spinner while the sensor catalog downloads.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// A new parameter set holding the API key and the current Unix time.
    pub fn signature_params(&self) -> SignatureParams {
        SignatureParams::new()
            .with(KEY_PARAM, &self.key)
            .with(TIMESTAMP_PARAM, unix_now())
    }

    /// Builds the signed absolute URL for a relative API path.
    pub fn build_url(&self, path: &str, params: SignatureParams) -> Result<String> {
        build_url(path, params, &self.key, &self.secret)
    }

    /// The signed URL an endpoint would be requested with right now.
    pub fn signed_url(&self, endpoint: &Endpoint) -> Result<String> {
        let params = endpoint.sign_fields(self.signature_params());
        self.build_url(&endpoint.path(), params)
    }

    /// All weather stations associated with the API key.
    pub fn all_stations(&self) -> Result<StationsResponse> {
        self.stations(&[])
    }

    /// Weather stations for the given station ids.
    pub fn stations(&self, ids: &[u64]) -> Result<StationsResponse> {
        self.fetch(&Endpoint::Stations(ids.to_vec()))
    }

    /// All sensors attached to all stations associated with the API key.
    pub fn all_sensors(&self) -> Result<SensorsResponse> {
        self.sensors(&[])
    }

    /// Sensors for the given sensor ids.
    pub fn sensors(&self, ids: &[u64]) -> Result<SensorsResponse> {
        self.fetch(&Endpoint::Sensors(ids.to_vec()))
    }

    /// Current conditions for one station.
    pub fn current(&self, station: u64) -> Result<CurrentResponse> {
        self.fetch(&Endpoint::Current(station))
    }

    /// Archive records for one station between `start` and `end`.
    ///
    /// The server limits the span (24 hours at the time of writing); that
    /// limit is not checked here.
    pub fn historic(
        &self,
        station: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistoricResponse> {
        self.fetch(&Endpoint::Historic {
            station,
            start,
            end,
        })
    }

    /// Any endpoint's response as untyped JSON.
    pub fn fetch_json(&self, endpoint: &Endpoint) -> Result<Value> {
        self.fetch(endpoint)
    }

    /// Saves the catalog of all sensor types to `target`.
    ///
    /// The body is streamed straight to disk; if the stream breaks the
    /// partial file is left behind.
    pub fn sensor_catalog(&self, target: &Path) -> Result<PathBuf> {
        let endpoint = Endpoint::SensorCatalog;
        let mut resp = self.send(&endpoint)?;

        let io_err = |source| Error::Io {
            path: target.to_path_buf(),
            source,
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let mut out = File::create(target).map_err(io_err)?;

        let pb = if self.progress {
            let pb = match resp.content_length {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            };
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} {bytes} ({bytes_per_sec}) {msg}",
            ) {
                pb.set_style(style);
            }
            pb.set_message("sensor catalog");
            Some(pb)
        } else {
            None
        };

        let mut written: u64 = 0;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = match resp.body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => return Err(Error::transport(e)),
            };
            out.write_all(&buf[..n]).map_err(io_err)?;
            written += n as u64;
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        }
        out.flush().map_err(io_err)?;

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        info!(path = %target.display(), bytes = written, "saved sensor catalog");
        Ok(target.to_path_buf())
    }

    fn fetch<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let mut resp = self.send(endpoint)?;
        let mut body = Vec::new();
        resp.body.read_to_end(&mut body).map_err(Error::transport)?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            operation: endpoint.operation(),
            source,
        })
    }

    /// Signs and sends one GET, requiring `200 OK`.
    fn send(&self, endpoint: &Endpoint) -> Result<TransportResponse> {
        let url = self.signed_url(endpoint)?;
        debug!(operation = endpoint.operation(), path = %endpoint.path(), "sending request");

        let resp = self.transport.get(&url)?;
        debug!(operation = endpoint.operation(), status = %resp.status, "received response");

        if resp.status != StatusCode::OK {
            return Err(Error::Status {
                operation: endpoint.operation(),
                status: resp.status,
            });
        }
        Ok(resp)
    }
}

fn validate(config: &ClientConfig) -> Result<()> {
    if config.key.trim().is_empty() || config.secret.trim().is_empty() {
        return Err(Error::Config("key and secret required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        let transport = |_: &str| -> Result<TransportResponse> {
            Ok(TransportResponse::from_bytes(StatusCode::OK, "{}"))
        };
        Client::with_transport(ClientConfig::new("mykey", "mysecret"), transport).unwrap()
    }

    #[test]
    fn signature_params_hold_key_and_fresh_timestamp() {
        let before = unix_now();
        let p = client().signature_params();
        let t: i64 = p.get("t").unwrap().parse().unwrap();
        assert_eq!(p.get("api-key"), Some("mykey"));
        assert!(t >= before && t <= unix_now());
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn build_url_matches_known_vector() {
        let c = client();
        let p = c.signature_params().with("foo", "bar").with("t", "123");
        assert_eq!(p.canonical(), "api-keymykeyfoobart123");
        assert_eq!(
            c.build_url("/foo", p).unwrap(),
            "https://api.weatherlink.com/v2/foo?api-key=mykey&api-signature=e576785c250d8c8db2e5fc2b7857b4c39ee56958107b978137e10d0fa6c1bc7b&t=123"
        );
    }

    #[test]
    fn rejects_empty_credentials() {
        for (k, s) in [("", "secret"), ("key", ""), ("  ", "secret")] {
            let transport =
                |_: &str| -> Result<TransportResponse> { panic!("no request expected") };
            let err = Client::with_transport(ClientConfig::new(k, s), transport).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
    }

    #[test]
    fn debug_hides_secret() {
        let cfg = ClientConfig::new("mykey", "mysecret");
        assert!(!format!("{cfg:?}").contains("mysecret"));
        assert!(!format!("{:?}", client()).contains("mysecret"));
    }
}
