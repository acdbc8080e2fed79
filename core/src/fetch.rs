use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("HTTP {code}: {reason}")]
  Status { code: u16, reason: String },
  #[error("response is not valid JSON: {0}")]
  Decode(String),
}

/// Retrieves the current document for an endpoint.
///
/// Retries and backoff belong to implementations; the engine calls `fetch`
/// once per poll cycle.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, endpoint: &str, headers: &BTreeMap<String, String>) -> Result<Value, FetchError>;
}

impl<F> Fetcher for F
where
  F: Fn(&str, &BTreeMap<String, String>) -> Result<Value, FetchError> + Send + Sync,
{
  fn fetch(&self, endpoint: &str, headers: &BTreeMap<String, String>) -> Result<Value, FetchError> {
    self(endpoint, headers)
  }
}

#[cfg(feature = "http")]
pub use self::http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
  use std::{collections::BTreeMap, time::Duration};

  use serde_json::Value;

  use super::{FetchError, Fetcher};

  /// Blocking HTTP GET returning the parsed JSON body.
  #[derive(Debug, Clone)]
  pub struct HttpFetcher {
    client: reqwest::blocking::Client,
  }

  impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
      let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Transport(e.to_string()))?;
      Ok(Self { client })
    }
  }

  impl Fetcher for HttpFetcher {
    fn fetch(&self, endpoint: &str, headers: &BTreeMap<String, String>) -> Result<Value, FetchError> {
      let mut req = self.client.get(endpoint);
      for (k, v) in headers {
        req = req.header(k.as_str(), v.as_str());
      }
      let resp = req.send().map_err(|e| FetchError::Transport(e.to_string()))?;
      let status = resp.status();
      if !status.is_success() {
        return Err(FetchError::Status {
          code: status.as_u16(),
          reason: status.canonical_reason().unwrap_or("").to_string(),
        });
      }
      resp.json::<Value>().map_err(|e| FetchError::Decode(e.to_string()))
    }
  }
}
