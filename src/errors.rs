// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Error Types
 * Error taxonomy for the detection and scoring engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Engine error taxonomy. Nothing here is fatal to the overall process;
/// the worst outcome of a scan is a partial result set.
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Per-URL/per-probe network failure. Caught and logged by the phase
    /// that issued the request; the URL is dropped and the scan continues.
    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// Per-request timeout
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Invalid URL, unparsable manifest/HTML. Analyzers return empty
    /// results instead of raising this; it surfaces only at entry points.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Auth config or crawler option out of allowed bounds. Rejected
    /// before the corresponding phase starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// robots.txt disallow without recorded override consent
    #[error("Policy violation: {path} is disallowed by robots.txt")]
    PolicyViolation { path: String },

    /// Scan cancellation was requested
    #[error("Scan cancelled")]
    Cancelled,
}

impl ScannerError {
    pub fn network(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
