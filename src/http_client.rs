// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Client
 * Outbound request wrapper with per-request timeout and session support
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::SessionCredentials;

/// Realistic browser User-Agents to avoid trivial blocks
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

fn get_browser_user_agent() -> &'static str {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    /// Session cookie/headers, scan-scoped. Dropped with the client.
    session_headers: Vec<(String, String)>,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(get_browser_user_agent())
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            session_headers: Vec::new(),
        })
    }

    /// Attach session credentials to every request this client sends
    pub fn with_session(mut self, session: &SessionCredentials) -> Self {
        if let Some(cookie) = &session.cookie {
            self.session_headers
                .push(("Cookie".to_string(), cookie.clone()));
        }
        for (name, value) in &session.headers {
            self.session_headers.push((name.clone(), value.clone()));
        }
        self
    }

    pub fn has_session(&self) -> bool {
        !self.session_headers.is_empty()
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.get_with_headers(url, &[]).await
    }

    /// GET with extra per-request headers (on top of session headers)
    pub async fn get_with_headers(
        &self,
        url: &str,
        extra_headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in self.session_headers.iter().chain(extra_headers.iter()) {
            request = request.header(name, value);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        Self::into_http_response(response, start).await
    }

    /// GET without any session headers attached (unauthenticated probe)
    pub async fn get_unauthenticated(&self, url: &str) -> Result<HttpResponse> {
        self.get_unauthenticated_with_headers(url, &[]).await
    }

    /// GET carrying only the given headers. The scan's session stays
    /// detached, so a forged credential in `extra_headers` is the only
    /// credential the server sees.
    pub async fn get_unauthenticated_with_headers(
        &self,
        url: &str,
        extra_headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in extra_headers {
            request = request.header(name, value);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        Self::into_http_response(response, start).await
    }

    /// POST with application/x-www-form-urlencoded body
    pub async fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<HttpResponse> {
        let mut request = self.client.post(url).form(form);
        for (name, value) in &self.session_headers {
            request = request.header(name, value);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?;

        Self::into_http_response(response, start).await
    }

    async fn into_http_response(
        response: reqwest::Response,
        start: Instant,
    ) -> Result<HttpResponse> {
        let status_code = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or("").to_string();
            // Multiple Set-Cookie headers are newline-joined so every
            // cookie stays individually parseable
            headers
                .entry(key)
                .and_modify(|existing: &mut String| {
                    existing.push('\n');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body_bytes = response.bytes().await.context("Failed to read body")?;
        if body_bytes.len() > MAX_BODY_SIZE {
            debug!("Response body truncated at {} bytes", MAX_BODY_SIZE);
        }
        let capped = &body_bytes[..body_bytes.len().min(MAX_BODY_SIZE)];
        let body = String::from_utf8_lossy(capped).to_string();

        Ok(HttpResponse {
            status_code,
            body,
            headers,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    pub fn is_html(&self) -> bool {
        self.header("content-type")
            .map(|ct| ct.to_lowercase().contains("text/html"))
            .unwrap_or_else(|| self.body.trim_start().starts_with('<'))
    }
}
