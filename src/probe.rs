use std::time::Duration;

use tracing::debug;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Corporate sites routinely serve bots a stripped page, so the probe
// identifies as a desktop browser with a Swedish language preference.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "sv-SE,sv;q=0.9,en;q=0.8";

// ── Fetch result ─────────────────────────────────────────────────────────────

/// Outcome of probing one candidate page. Never an error: timeouts,
/// transport failures and status ≥400 all come back as `fetch_failed`
/// so the pipeline can move on to the next page.
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    pub requested_url: String,
    pub html_body: String,
    pub http_status: Option<u16>,
    pub fetch_failed: bool,
}

impl PageFetchResult {
    pub fn success(url: &str, status: u16, body: String) -> Self {
        Self {
            requested_url: url.to_string(),
            html_body: body,
            http_status: Some(status),
            fetch_failed: false,
        }
    }

    pub fn failure(url: &str, status: Option<u16>) -> Self {
        Self {
            requested_url: url.to_string(),
            html_body: String::new(),
            http_status: status,
            fetch_failed: true,
        }
    }
}

// ── Fetch seam ───────────────────────────────────────────────────────────────

/// The pipeline's only view of the network; tests substitute a scripted
/// implementation.
pub trait FetchPage {
    async fn fetch(&self, url: &str, timeout: Duration) -> PageFetchResult;
}

// ── Prober ───────────────────────────────────────────────────────────────────

pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new() -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, ACCEPT.parse().expect("valid header"));
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            ACCEPT_LANGUAGE.parse().expect("valid header"),
        );

        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .expect("failed to build http client");

        Self { client }
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchPage for Prober {
    /// One GET with a hard deadline. The whole request, redirects and body
    /// read included, runs under a single `tokio::time::timeout`; hitting
    /// the deadline drops the in-flight request.
    async fn fetch(&self, url: &str, timeout: Duration) -> PageFetchResult {
        let attempt = async {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = if status >= 400 {
                String::new()
            } else {
                response.text().await?
            };
            Ok::<(u16, String), reqwest::Error>((status, body))
        };

        match tokio::time::timeout(timeout, attempt).await {
            Err(_elapsed) => {
                debug!(url, timeout_ms = timeout.as_millis() as u64, "page fetch timed out");
                PageFetchResult::failure(url, None)
            }
            Ok(Err(e)) => {
                debug!(url, error = %e, "page fetch failed");
                PageFetchResult::failure(url, None)
            }
            Ok(Ok((status, _))) if status >= 400 => {
                debug!(url, status, "page fetch returned error status");
                PageFetchResult::failure(url, Some(status))
            }
            Ok(Ok((status, body))) => PageFetchResult::success(url, status, body),
        }
    }
}
