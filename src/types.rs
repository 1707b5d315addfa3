// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

/// Scan mode selects which phases run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Static,
    Dynamic,
    Both,
}

impl Default for ScanMode {
    fn default() -> Self {
        ScanMode::Both
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Static => write!(f, "static"),
            ScanMode::Dynamic => write!(f, "dynamic"),
            ScanMode::Both => write!(f, "both"),
        }
    }
}

impl ScanMode {
    pub fn runs_static(&self) -> bool {
        matches!(self, ScanMode::Static | ScanMode::Both)
    }

    pub fn runs_dynamic(&self) -> bool {
        matches!(self, ScanMode::Dynamic | ScanMode::Both)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
        }
    }
}

/// A single reported vulnerability. Immutable once created; produced by
/// exactly one analyzer or tester and only filtered/aggregated downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub rule_id: String,
    pub category: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub description: String,
    /// Source locator: URL plus line, or endpoint URL
    pub location: String,
    pub remediation: String,
    /// Redacted snippet. Secret values never appear here.
    pub evidence: Option<String>,
    pub discovered_at: String,
}

/// Random finding identifier, UUID-shaped
pub fn new_finding_id(prefix: &str) -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!(
        "{}_{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        prefix,
        rng.random::<u32>(),
        rng.random::<u16>(),
        rng.random::<u16>(),
        rng.random::<u16>(),
        rng.random::<u64>() & 0xffffffffffff
    )
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
    Info,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "Passed"),
            TestOutcome::Failed => write!(f, "Failed"),
            TestOutcome::Info => write!(f, "Info"),
            TestOutcome::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// One pass/fail configuration check contributing to the score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityTest {
    pub test_name: String,
    pub passed: bool,
    pub score_delta: i32,
    pub outcome: TestOutcome,
    pub reason: String,
    pub recommendation: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl SecurityTest {
    pub fn passed(name: &str, reason: &str) -> Self {
        Self {
            test_name: name.to_string(),
            passed: true,
            score_delta: 0,
            outcome: TestOutcome::Passed,
            reason: reason.to_string(),
            recommendation: String::new(),
            details: serde_json::Value::Null,
        }
    }

    pub fn failed(name: &str, delta: i32, reason: &str, recommendation: &str) -> Self {
        Self {
            test_name: name.to_string(),
            passed: false,
            score_delta: delta,
            outcome: TestOutcome::Failed,
            reason: reason.to_string(),
            recommendation: recommendation.to_string(),
            details: serde_json::Value::Null,
        }
    }

    pub fn info(name: &str, delta: i32, reason: &str) -> Self {
        Self {
            test_name: name.to_string(),
            passed: delta >= 0,
            score_delta: delta,
            outcome: TestOutcome::Info,
            reason: reason.to_string(),
            recommendation: String::new(),
            details: serde_json::Value::Null,
        }
    }

    pub fn not_applicable(name: &str, reason: &str) -> Self {
        Self {
            test_name: name.to_string(),
            passed: true,
            score_delta: 0,
            outcome: TestOutcome::NotApplicable,
            reason: reason.to_string(),
            recommendation: String::new(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub test_name: String,
    pub score_delta: i32,
    pub passed: bool,
}

/// Deterministic deduction-based score over the full SecurityTest list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    pub score: i32,
    pub risk_level: RiskLevel,
    /// Preserves input order for auditability
    pub breakdown: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMapSummary {
    pub pages_crawled: usize,
    pub endpoints: usize,
    pub forms: usize,
}

/// Full result set handed to the persistence collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    pub scan_id: String,
    pub target: String,
    pub mode: ScanMode,
    pub findings: Vec<Finding>,
    pub tests: Vec<SecurityTest>,
    pub scoring: ScoringResult,
    pub site_map_summary: SiteMapSummary,
    pub started_at: String,
    pub completed_at: String,
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serde_screaming_case() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"CRITICAL\"");
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"MEDIUM\"");
    }

    #[test]
    fn test_outcome_na_rename() {
        assert_eq!(
            serde_json::to_string(&TestOutcome::NotApplicable).unwrap(),
            "\"N/A\""
        );
    }

    #[test]
    fn test_finding_id_shape() {
        let id = new_finding_id("xss");
        assert!(id.starts_with("xss_"));
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn test_scan_mode_phases() {
        assert!(ScanMode::Both.runs_static() && ScanMode::Both.runs_dynamic());
        assert!(ScanMode::Static.runs_static() && !ScanMode::Static.runs_dynamic());
        assert!(!ScanMode::Dynamic.runs_static() && ScanMode::Dynamic.runs_dynamic());
    }
}
