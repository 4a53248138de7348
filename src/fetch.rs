//! Outbound HTTP: one shared client, a rotating user-agent pool, and typed
//! fetch failures. Every request is a single GET with its own timeout; nothing
//! here retries.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

/// Why a single fetch failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Pool of browser user-agent strings; one is picked at random per request.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Build a pool from the given strings, falling back to the built-in
    /// list when nothing usable is supplied.
    pub fn new(agents: Vec<String>) -> Self {
        let agents: Vec<String> = agents
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        if agents.is_empty() {
            return Self::default();
        }

        Self { agents }
    }

    /// Load one user-agent per line from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user agents from {}", path.display()))?;

        Ok(Self::new(content.lines().map(str::to_string).collect()))
    }

    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a == agent)
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// HTTP fetcher shared by the sitemap resolver and the page analyzer
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    user_agents: UserAgentPool,
}

impl Fetcher {
    pub fn new(user_agents: UserAgentPool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            user_agents,
        })
    }

    /// GET `url` with a random user-agent, failing on timeout or non-2xx.
    pub async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let user_agent = self.user_agents.pick();
        debug!("GET {} (timeout {:?})", url, timeout);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(body.to_vec())
    }

    /// Same as [`Fetcher::get_bytes`], decoding the body as lossy UTF-8.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let body = self.get_bytes(url, timeout).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn classify(url: &str, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== UserAgentPool Tests ====================

    #[test]
    fn test_default_pool_is_not_empty() {
        let pool = UserAgentPool::default();
        assert!(!pool.is_empty());
        assert!(pool.contains(pool.pick()));
    }

    #[test]
    fn test_new_pool_skips_blank_entries() {
        let pool = UserAgentPool::new(vec![
            "  ".to_string(),
            "AgentA/1.0".to_string(),
            "".to_string(),
        ]);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.pick(), "AgentA/1.0");
    }

    #[test]
    fn test_new_pool_falls_back_to_defaults() {
        let pool = UserAgentPool::new(vec!["".to_string()]);
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
    }

    #[test]
    fn test_pool_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("agents.txt");
        std::fs::write(&file, "AgentA/1.0\n\nAgentB/2.0\n").unwrap();

        let pool = UserAgentPool::from_file(&file).expect("should load");
        assert_eq!(pool.len(), 2);
        assert!(pool.contains("AgentB/2.0"));
    }

    #[test]
    fn test_pool_from_missing_file_errors() {
        assert!(UserAgentPool::from_file("/nonexistent/agents.txt").is_err());
    }

    // ==================== Fetcher Tests ====================

    #[tokio::test]
    async fn test_get_text_success_sends_pooled_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "AuditBot/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(UserAgentPool::new(vec!["AuditBot/1.0".to_string()])).unwrap();
        let body = fetcher
            .get_text(&format!("{}/page", mock_server.uri()), Duration::from_secs(5))
            .await
            .expect("should fetch");

        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_get_text_non_success_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(UserAgentPool::default()).unwrap();
        let result = fetcher
            .get_text(&format!("{}/missing", mock_server.uri()), Duration::from_secs(5))
            .await;

        match result {
            Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_text_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(UserAgentPool::default()).unwrap();
        let result = fetcher
            .get_text(&format!("{}/slow", mock_server.uri()), Duration::from_millis(200))
            .await;

        assert!(matches!(result, Err(FetchError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_get_text_does_not_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(UserAgentPool::default()).unwrap();
        let result = fetcher
            .get_text(&format!("{}/flaky", mock_server.uri()), Duration::from_secs(5))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_text_connection_error() {
        let fetcher = Fetcher::new(UserAgentPool::default()).unwrap();
        let result = fetcher
            .get_text("http://127.0.0.1:1/nothing", Duration::from_secs(2))
            .await;

        assert!(result.is_err());
    }
}
