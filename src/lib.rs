//! A Rust client for the Davis WeatherLink v2 API.
//!
//! Every request is authenticated by an HMAC-SHA256 signature carried in the
//! query string together with the API key and a Unix timestamp. The client
//! signs, sends one GET through a pluggable [`Transport`] and decodes the
//! JSON into typed responses.
//!
//! ## Quick start
//! - Configure credentials via environment variables (`WEATHERLINK_API_KEY`,
//!   `WEATHERLINK_API_SECRET`) or a `.weatherlinkrc` file (current directory or home).
//! - Or pass a [`ClientConfig`] to [`Client::new`].
//!
//! ```no_run
//! use weatherlink::{Client, ClientConfig};
//!
//! fn main() -> weatherlink::Result<()> {
//!     let client = Client::new(ClientConfig::new("mykey", "mysecret"))?;
//!     for station in client.all_stations()?.stations {
//!         let current = client.current(station.station_id)?;
//!         println!("{}: {} sensor(s)", station.station_name, current.sensors.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
pub mod models;
mod request;
mod signature;
mod transport;
mod util;

pub use client::{Client, ClientConfig};
pub use error::{Error, Result};
pub use request::Endpoint;
pub use signature::{SignatureParams, sign};
pub use transport::{HttpTransport, Transport, TransportResponse};

pub use reqwest::StatusCode;
