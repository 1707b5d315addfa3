// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Configuration
 * Crawler options and authenticated-scan configuration with bounds validation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::ScannerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Session credentials supplied by the caller for an authenticated scan.
/// Scoped to a single scan execution; the engine drops them with the scan
/// and never parks them in any process-wide structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    /// Cookie header value, e.g. "session=abc123"
    #[serde(default)]
    pub cookie: Option<String>,
    /// Extra headers attached to every request (e.g. Authorization)
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl SessionCredentials {
    pub fn is_empty(&self) -> bool {
        self.cookie.is_none() && self.headers.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerOptions {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Inter-request delay per target host, in milliseconds
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    #[serde(default = "default_true")]
    pub respect_robots: bool,

    /// Recorded consent to override robots.txt restrictions
    #[serde(default)]
    pub robots_override_consent: bool,

    #[serde(default)]
    pub allow_external: bool,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionCredentials>,
}

fn default_max_depth() -> usize {
    3
}

fn default_max_pages() -> usize {
    50
}

fn default_rate_limit_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_true() -> bool {
    true
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            rate_limit_ms: default_rate_limit_ms(),
            respect_robots: true,
            robots_override_consent: false,
            allow_external: false,
            request_timeout_secs: default_timeout_secs(),
            session: None,
        }
    }
}

impl CrawlerOptions {
    /// Validate option bounds before the crawl phase starts
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.max_depth == 0 || self.max_depth > 10 {
            return Err(ScannerError::Configuration(format!(
                "maxDepth must be between 1 and 10, got {}",
                self.max_depth
            )));
        }

        if self.max_pages == 0 || self.max_pages > 500 {
            return Err(ScannerError::Configuration(format!(
                "maxPages must be between 1 and 500, got {}",
                self.max_pages
            )));
        }

        if self.rate_limit_ms < 100 || self.rate_limit_ms > 10_000 {
            return Err(ScannerError::Configuration(format!(
                "rateLimitMs must be between 100 and 10000, got {}",
                self.rate_limit_ms
            )));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 9 {
            return Err(ScannerError::Configuration(format!(
                "requestTimeoutSecs must be between 1 and 9, got {}",
                self.request_timeout_secs
            )));
        }

        Ok(())
    }
}

/// Authenticated-scan configuration supplied by the caller. A rejected
/// config aborts the authenticated phase only, never the whole scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub login_url: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub protected_pages: Vec<String>,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ScannerError> {
        let url = Url::parse(&self.login_url).map_err(|e| {
            ScannerError::Configuration(format!("loginUrl is not a valid URL: {e}"))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScannerError::Configuration(format!(
                "loginUrl must be http(s), got {}",
                url.scheme()
            )));
        }

        for (name, selector) in [
            ("usernameSelector", &self.username_selector),
            ("passwordSelector", &self.password_selector),
            ("submitSelector", &self.submit_selector),
        ] {
            if selector.trim().is_empty() {
                return Err(ScannerError::Configuration(format!(
                    "{name} must not be empty"
                )));
            }
        }

        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            return Err(ScannerError::Configuration(
                "credentials must not be blank".to_string(),
            ));
        }

        for page in &self.protected_pages {
            Url::parse(page).map_err(|e| {
                ScannerError::Configuration(format!("protected page {page} is invalid: {e}"))
            })?;
        }

        Ok(())
    }
}
