// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Dependency Analyzer
 * Known-vulnerable and end-of-life version checks over an npm manifest
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{ResponseContext, StaticAnalyzer};
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use serde_json::Value;
use tracing::{debug, warn};

/// Packages with a published advisory. `fixed_in` is the first safe
/// version; any declared version below it is flagged.
struct Advisory {
    package: &'static str,
    fixed_in: &'static str,
    advisory: &'static str,
}

const ADVISORIES: &[Advisory] = &[
    Advisory { package: "lodash", fixed_in: "4.17.21", advisory: "prototype pollution (CVE-2021-23337)" },
    Advisory { package: "minimist", fixed_in: "1.2.6", advisory: "prototype pollution (CVE-2021-44906)" },
    Advisory { package: "jquery", fixed_in: "3.5.0", advisory: "XSS via htmlPrefilter (CVE-2020-11022)" },
    Advisory { package: "axios", fixed_in: "0.21.2", advisory: "SSRF via redirect (CVE-2021-3749)" },
    Advisory { package: "express", fixed_in: "4.17.3", advisory: "qs prototype pollution dependency chain" },
    Advisory { package: "handlebars", fixed_in: "4.7.7", advisory: "template injection to RCE (CVE-2021-23369)" },
    Advisory { package: "node-fetch", fixed_in: "2.6.7", advisory: "header exposure on redirect (CVE-2022-0235)" },
    Advisory { package: "ejs", fixed_in: "3.1.7", advisory: "template injection to RCE (CVE-2022-29078)" },
    Advisory { package: "moment", fixed_in: "2.29.4", advisory: "path traversal in locale loading (CVE-2022-24785)" },
    Advisory { package: "serialize-javascript", fixed_in: "3.1.0", advisory: "XSS via crafted object (CVE-2020-7660)" },
];

/// Packages whose older major lines no longer receive security patches
const END_OF_LIFE_MAJORS: &[(&str, u64)] = &[
    ("jquery", 3),
    ("angular", 2),
    ("bootstrap", 4),
    ("vue", 3),
    ("webpack", 5),
];

/// Strip range operators (^ ~ >= > =) and compare dotted integers.
/// Returns None when either side is not a plain dotted version.
fn version_lt(declared: &str, threshold: &str) -> Option<bool> {
    let declared = parse_version(declared)?;
    let threshold = parse_version(threshold)?;
    Some(declared < threshold)
}

fn parse_version(raw: &str) -> Option<Vec<u64>> {
    let trimmed = raw
        .trim()
        .trim_start_matches(['^', '~', '=', 'v'])
        .trim_start_matches(">=")
        .trim_start_matches('>')
        .trim();
    let parts: Vec<u64> = trimmed
        .split('.')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts)
}

fn declared_major(raw: &str) -> Option<u64> {
    parse_version(raw).map(|v| v[0])
}

pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticAnalyzer for DependencyAnalyzer {
    fn name(&self) -> &'static str {
        "deps"
    }

    /// `source` is package.json text. A manifest that does not parse is
    /// not an error, just nothing to analyze.
    fn analyze(
        &self,
        source: &str,
        locator: &str,
        _ctx: Option<&ResponseContext>,
    ) -> Vec<Finding> {
        let manifest: Value = match serde_json::from_str(source) {
            Ok(v) => v,
            Err(e) => {
                warn!("[Deps] Manifest at {} is not valid JSON: {}", locator, e);
                return Vec::new();
            }
        };

        let mut declared: Vec<(String, String)> = Vec::new();
        for section in ["dependencies", "devDependencies"] {
            if let Some(map) = manifest.get(section).and_then(Value::as_object) {
                for (name, version) in map {
                    if let Some(version) = version.as_str() {
                        declared.push((name.clone(), version.to_string()));
                    }
                }
            }
        }

        let mut findings = Vec::new();
        for (name, version) in &declared {
            for advisory in ADVISORIES {
                if advisory.package != name {
                    continue;
                }
                if version_lt(version, advisory.fixed_in) == Some(true) {
                    if let Some(r) = rule("vulnerable-dependency") {
                        findings.push(r.finding(
                            Confidence::High,
                            format!(
                                "{name}@{version} is vulnerable: {}; fixed in {}",
                                advisory.advisory, advisory.fixed_in
                            ),
                            locator.to_string(),
                            Some(format!("\"{name}\": \"{version}\"")),
                        ));
                    }
                }
            }

            for (package, supported_major) in END_OF_LIFE_MAJORS {
                if package != name {
                    continue;
                }
                if let Some(major) = declared_major(version) {
                    if major < *supported_major {
                        if let Some(r) = rule("outdated-dependency") {
                            findings.push(r.finding(
                                Confidence::Medium,
                                format!(
                                    "{name}@{version} is on an end-of-life major line (current: {supported_major}.x)"
                                ),
                                locator.to_string(),
                                Some(format!("\"{name}\": \"{version}\"")),
                            ));
                        }
                    }
                }
            }
        }

        debug!(
            "[Deps] {} findings over {} declared packages",
            findings.len(),
            declared.len()
        );
        findings
    }
}
