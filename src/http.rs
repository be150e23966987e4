//! HTTP client seam for the geolocation and sun-times services.
//!
//! Both services speak simple JSON-over-GET, so the seam is a single
//! `get_json` method. Production code uses [`UreqClient`], a blocking agent
//! with a bounded global timeout; tests use [`testing::CannedHttpClient`] to
//! script per-URL responses and failures without touching the network.

use std::time::Duration;

use anyhow::{Context, Result};

/// Default timeout applied to every outbound request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking JSON fetch abstraction.
pub trait HttpClient: Send + Sync {
    /// GET a URL and parse the response body as JSON.
    ///
    /// Timeouts, non-2xx statuses, and malformed bodies are all ordinary
    /// `Err` values; callers treat them as a per-request failure.
    fn get_json(&self, url: &str) -> Result<serde_json::Value>;
}

/// Production client backed by a shared `ureq` agent.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Create a client with the default 10 second timeout.
    pub fn new() -> Self {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    /// Create a client with a custom global timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("Request failed: {url}"))?;

        response
            .into_body()
            .read_json::<serde_json::Value>()
            .with_context(|| format!("Invalid JSON response from {url}"))
    }
}

#[cfg(any(test, feature = "testing-support"))]
pub mod testing {
    use std::sync::Mutex;

    use anyhow::{Result, anyhow};

    use super::HttpClient;

    enum Canned {
        Json(serde_json::Value),
        Failure(String),
    }

    /// Scripted HTTP client for tests.
    ///
    /// Responses are registered against URL substrings; the first matching
    /// pattern wins, so register more specific patterns first. Unmatched
    /// URLs fail, which doubles as a network-isolation guard in tests.
    pub struct CannedHttpClient {
        responses: Mutex<Vec<(String, Canned)>>,
        requests: Mutex<Vec<String>>,
    }

    impl Default for CannedHttpClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CannedHttpClient {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Serve a JSON document for URLs containing `pattern`.
        pub fn respond_json(&self, pattern: &str, body: serde_json::Value) {
            self.responses
                .lock()
                .unwrap()
                .push((pattern.to_string(), Canned::Json(body)));
        }

        /// Fail requests for URLs containing `pattern` (simulated timeout or
        /// malformed body).
        pub fn respond_failure(&self, pattern: &str, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push((pattern.to_string(), Canned::Failure(message.to_string())));
        }

        /// Drop every registered response. Subsequent requests fail as
        /// unmatched, which simulates a network that went away mid-test.
        pub fn clear_responses(&self) {
            self.responses.lock().unwrap().clear();
        }

        /// URLs requested so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpClient for CannedHttpClient {
        fn get_json(&self, url: &str) -> Result<serde_json::Value> {
            self.requests.lock().unwrap().push(url.to_string());
            let responses = self.responses.lock().unwrap();
            for (pattern, canned) in responses.iter() {
                if url.contains(pattern.as_str()) {
                    return match canned {
                        Canned::Json(body) => Ok(body.clone()),
                        Canned::Failure(message) => Err(anyhow!("{message}: {url}")),
                    };
                }
            }
            Err(anyhow!("No canned response for {url}"))
        }
    }
}
