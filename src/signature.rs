//! Request signing.
//!
//! The server recomputes the signature from the parameters it receives, so
//! the canonical form has to match byte for byte: names sorted ascending,
//! each name immediately followed by its value, nothing in between.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub(crate) const KEY_PARAM: &str = "api-key";
pub(crate) const SIGNATURE_PARAM: &str = "api-signature";
pub(crate) const TIMESTAMP_PARAM: &str = "t";

/// The name/value pairs contributing to one request's signature.
///
/// Built fresh for every call and consumed when the URL is built. Insertion
/// order does not matter; the map keeps names in byte-wise order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureParams {
    params: BTreeMap<String, String>,
}

impl SignatureParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set with `name` set to `value`, replacing any previous value.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Inserts `name` only if it is not present yet. Returns whether it was inserted.
    pub(crate) fn insert_if_absent(&mut self, name: &str, value: &str) -> bool {
        if self.params.contains_key(name) {
            return false;
        }
        self.params.insert(name.to_string(), value.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The unencoded string the HMAC is computed over.
    ///
    /// `api-signature` never signs itself and is skipped if present.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.params {
            if name == SIGNATURE_PARAM {
                continue;
            }
            out.push_str(name);
            out.push_str(value);
        }
        out
    }

    /// Lower-case hex HMAC-SHA256 of [`canonical`](Self::canonical) keyed by `secret`.
    pub fn signature(&self, secret: &str) -> String {
        sign(secret, &self.canonical())
    }
}

impl<K, V> FromIterator<(K, V)> for SignatureParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Hex-encoded HMAC-SHA256 of `message` using `secret` as the key.
pub fn sign(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
