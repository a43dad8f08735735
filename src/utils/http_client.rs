use reqwest::Client;
use std::time::Duration;

/// Knobs for the client shared by every dispatch unit.
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfig {
    /// Per-request timeout. `None` keeps reqwest's default (no timeout).
    pub timeout_seconds: Option<u64>,
    /// Idle connections kept per host; sized to the concurrency so finished
    /// units hand their connection to the next one instead of reconnecting.
    pub max_idle_per_host: Option<usize>,
}

/// Builds the one `reqwest::Client` shared by all units of a run.
pub fn get_client(config: Option<HttpClientConfig>) -> Result<Client, reqwest::Error> {
    let config = config.unwrap_or_default();
    let mut builder = Client::builder();

    if let Some(secs) = config.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(idle) = config.max_idle_per_host {
        builder = builder.pool_max_idle_per_host(idle);
    }

    builder.build()
}
