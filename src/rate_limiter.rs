// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Request Gate
 * Per-host rate limiting shared by every phase of a scan
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use nonzero_ext::nonzero;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

type HostLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Gate enforcing the configured inter-request delay per target host.
/// Every outbound request path of a scan waits here first, so bounded
/// concurrency can never be used to bypass rate limiting.
pub struct RequestGate {
    period: Duration,
    hosts: RwLock<HashMap<String, Arc<HostLimiter>>>,
}

impl RequestGate {
    /// `rate_limit_ms` is the minimum spacing between requests to one host
    pub fn new(rate_limit_ms: u64) -> Self {
        Self {
            period: Duration::from_millis(rate_limit_ms.max(1)),
            hosts: RwLock::new(HashMap::new()),
        }
    }

    fn host_of(url: &str) -> String {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn new_limiter(&self) -> Arc<HostLimiter> {
        let quota = Quota::with_period(self.period).unwrap_or_else(|| Quota::per_second(nonzero!(1u32)));
        Arc::new(GovernorRateLimiter::direct(quota))
    }

    /// Wait until a request to this URL's host is allowed
    pub async fn wait_for_slot(&self, url: &str) {
        let host = Self::host_of(url);

        let limiter = {
            let hosts = self.hosts.read().await;
            hosts.get(&host).cloned()
        };

        let limiter = match limiter {
            Some(l) => l,
            None => {
                let mut hosts = self.hosts.write().await;
                hosts
                    .entry(host.clone())
                    .or_insert_with(|| self.new_limiter())
                    .clone()
            }
        };

        limiter.until_ready().await;
        debug!("[Gate] Slot granted for {}", host);
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
