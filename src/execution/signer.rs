use crate::errors::{OrderError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// Request parameters in insertion order.
///
/// The encoded form is what gets signed, so the order pairs are pushed in is
/// the order they travel on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `application/x-www-form-urlencoded` form of the pairs
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

impl fmt::Display for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

pub struct RequestSigner {
    mac: HmacSha256,
}

impl RequestSigner {
    /// Create a signer keyed by the account's secret key
    pub fn new(secret_key: &str) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .map_err(|e| OrderError::ConfigError(format!("Invalid secret key: {}", e)))?;
        Ok(Self { mac })
    }

    /// Hex HMAC-SHA256 of an already encoded payload
    pub fn sign_payload(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Sign the encoded form of `params`
    pub fn sign(&self, params: &RequestParams) -> String {
        self.sign_payload(&params.encode())
    }
}
