// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Progress Notifications
 * Ordered, timestamped, leveled progress events per scan phase
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub timestamp: String,
    pub level: ProgressLevel,
    pub phase: String,
    pub message: String,
}

impl ProgressEvent {
    pub fn now(level: ProgressLevel, phase: &str, message: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            phase: phase.to_string(),
            message: message.to_string(),
        }
    }
}

/// Progress collaborator contract. Purely observational, no backpressure.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: ProgressEvent);
}

/// Default sink: forwards events to the tracing subscriber
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn notify(&self, event: ProgressEvent) {
        match event.level {
            ProgressLevel::Info => info!("[{}] {}", event.phase, event.message),
            ProgressLevel::Success => info!("[SUCCESS] [{}] {}", event.phase, event.message),
            ProgressLevel::Warning => warn!("[{}] {}", event.phase, event.message),
            ProgressLevel::Error => error!("[{}] {}", event.phase, event.message),
        }
    }
}

/// Buffering sink for tests and embedding callers
#[derive(Default)]
pub struct CollectingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("progress lock poisoned").clone()
    }
}

impl ProgressSink for CollectingProgress {
    fn notify(&self, event: ProgressEvent) {
        self.events.lock().expect("progress lock poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_preserves_order() {
        let sink = CollectingProgress::new();
        sink.notify(ProgressEvent::now(ProgressLevel::Info, "crawl", "started"));
        sink.notify(ProgressEvent::now(ProgressLevel::Success, "crawl", "done"));
        sink.notify(ProgressEvent::now(ProgressLevel::Warning, "xss", "skipped endpoint"));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].phase, "crawl");
        assert_eq!(events[1].level, ProgressLevel::Success);
        assert_eq!(events[2].phase, "xss");
    }

    #[test]
    fn test_event_timestamp_is_rfc3339() {
        let event = ProgressEvent::now(ProgressLevel::Info, "scan", "x");
        assert!(chrono::DateTime::parse_from_rfc3339(&event.timestamp).is_ok());
    }
}
