// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Verkko Scanner Library
 * Exposes crawler, analyzer, tester and scoring modules for embedding
 * and testing
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod crawler;
pub mod errors;
pub mod http_client;
pub mod payloads;
pub mod progress;
pub mod rate_limiter;
pub mod registry;
pub mod types;

// Static analysis modules
pub mod analyzers;

// Dynamic testers and scan orchestration
pub mod scanners;

// Deterministic scoring
pub mod scoring;

pub use config::{AuthConfig, CrawlerOptions, SessionCredentials};
pub use errors::ScannerError;
pub use scanners::{DynamicTester, ScanEngine};
pub use types::{
    Confidence, Finding, RiskLevel, ScanMode, ScanResults, ScoringResult, SecurityTest, Severity,
};
