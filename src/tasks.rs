use log::{debug, warn};
use reqwest::Client;
use std::time::Instant;

/// What a single dispatch unit observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server answered with this HTTP status.
    Status(u16),
    /// No response was obtained: connection refused, DNS failure, timeout,
    /// or the body could not be read to the end.
    TransportError(String),
}

impl Outcome {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::Status(code) => Some(*code),
            Outcome::TransportError(_) => None,
        }
    }
}

/// Something a dispatch unit can call once.
#[async_trait::async_trait]
pub trait Target: Send + Sync {
    /// Performs one call and returns only once the underlying connection is
    /// free again.
    ///
    /// # Returns
    /// The status the server answered with, or a transport error when no
    /// complete response was obtained. Never fails the caller.
    async fn fetch(&self) -> Outcome;

    /// Short human-readable name used in log lines.
    fn describe(&self) -> String;
}

/// Issues a plain GET against a fixed URL, with no custom headers or body.
pub struct HttpTarget {
    /// Client shared by every unit of the run; its pool is reused across calls.
    pub client: Client,
    /// The exact URL each call goes to.
    pub url: String,
}

impl HttpTarget {
    /// Creates a target for `url` that sends through `client`.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        HttpTarget { client, url: url.into() }
    }
}

#[async_trait::async_trait]
impl Target for HttpTarget {
    /// Sends the GET and drains the response body.
    ///
    /// # Returns
    /// `Outcome::Status` with the response code once the body has been read
    /// to the end, otherwise `Outcome::TransportError` describing the failure.
    async fn fetch(&self) -> Outcome {
        let start = Instant::now();

        let response = match self.client.get(&self.url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Request to '{}' failed: {}", self.url, e);
                return Outcome::TransportError(e.to_string());
            }
        };

        let status_code = response.status().as_u16();

        // Drain the body so the connection goes back to the pool.
        if let Err(e) = response.bytes().await {
            warn!("Reading body from '{}' failed after status {}: {}", self.url, status_code, e);
            return Outcome::TransportError(e.to_string());
        }

        debug!("'{}' answered {} in {:?}", self.url, status_code, start.elapsed());
        Outcome::Status(status_code)
    }

    /// Provides a descriptive name for the target, e.g. `GET http://host/path`.
    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }
}
