// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scoring Engine
 * Deterministic deduction-based score over the security test battery
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{RiskLevel, ScoreEntry, ScoringResult, SecurityTest};
use tracing::info;

const BASELINE: i32 = 100;

pub fn risk_level(score: i32) -> RiskLevel {
    match score {
        s if s >= 80 => RiskLevel::Low,
        s if s >= 60 => RiskLevel::Medium,
        s if s >= 40 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

/// Score a test battery: 100 plus the sum of every delta, clamped to
/// [0, 100]. Same tests in, same score out; there is no weighting state
/// outside the input list.
pub fn score(tests: &[SecurityTest]) -> ScoringResult {
    let total: i32 = tests.iter().map(|t| t.score_delta).sum();
    let score = (BASELINE + total).clamp(0, 100);
    let risk_level = risk_level(score);

    info!(
        "[Scoring] {} tests, sum of deltas {}, score {} ({})",
        tests.len(),
        total,
        score,
        risk_level
    );

    ScoringResult {
        score,
        risk_level,
        breakdown: tests
            .iter()
            .map(|t| ScoreEntry {
                test_name: t.test_name.clone(),
                score_delta: t.score_delta,
                passed: t.passed,
            })
            .collect(),
    }
}
