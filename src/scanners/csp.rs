// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Content-Security-Policy Evaluation
 * Directive-level policy checks feeding the scoring engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::SecurityTest;
use serde_json::json;
use std::collections::HashMap;

const AGGREGATE: &str = "Content-Security-Policy";
const MISSING_OR_DEGRADED_DELTA: i32 = -20;

/// Parsed policy: directive name (lowercased) to source list
#[derive(Debug, Default)]
pub(crate) struct Policy {
    directives: HashMap<String, Vec<String>>,
}

impl Policy {
    pub(crate) fn parse(raw: &str) -> Self {
        let mut directives = HashMap::new();
        for part in raw.split(';') {
            let mut tokens = part.split_whitespace();
            let Some(name) = tokens.next() else { continue };
            directives.insert(
                name.to_lowercase(),
                tokens.map(|t| t.to_lowercase()).collect(),
            );
        }
        Self { directives }
    }

    fn has(&self, directive: &str) -> bool {
        self.directives.contains_key(directive)
    }

    /// Effective script sources: script-src with default-src fallback
    fn script_sources(&self) -> Option<&[String]> {
        self.directives
            .get("script-src")
            .or_else(|| self.directives.get("default-src"))
            .map(|v| v.as_slice())
    }

    fn script_sources_contain(&self, keyword: &str) -> bool {
        self.script_sources()
            .map(|sources| sources.iter().any(|s| s == keyword))
            .unwrap_or(false)
    }

    fn style_sources_contain(&self, keyword: &str) -> bool {
        self.directives
            .get("style-src")
            .or_else(|| self.directives.get("default-src"))
            .map(|sources| sources.iter().any(|s| s == keyword))
            .unwrap_or(false)
    }

    /// Plaintext http: sources anywhere, or a bare wildcard among the
    /// effective script sources
    fn has_insecure_source(&self) -> bool {
        self.directives
            .values()
            .flatten()
            .any(|s| s.starts_with("http:"))
            || self.script_sources_contain("*")
    }
}

struct Check {
    name: &'static str,
    /// A failed high check degrades the whole policy
    high: bool,
    delta_on_fail: i32,
    passes: fn(&Policy) -> bool,
    fail_reason: &'static str,
    recommendation: &'static str,
}

const CHECKS: &[Check] = &[
    Check {
        name: "CSP: no unsafe-inline scripts",
        high: true,
        delta_on_fail: 0,
        passes: |p| !p.script_sources_contain("'unsafe-inline'"),
        fail_reason: "unsafe-inline in the script sources nullifies XSS protection",
        recommendation: "Replace unsafe-inline with nonces or hashes",
    },
    Check {
        name: "CSP: no unsafe-eval",
        high: true,
        delta_on_fail: 0,
        passes: |p| !p.script_sources_contain("'unsafe-eval'"),
        fail_reason: "unsafe-eval allows string-to-code execution under the policy",
        recommendation: "Remove unsafe-eval and eliminate eval()/new Function() call sites",
    },
    Check {
        name: "CSP: HTTPS-only sources",
        high: true,
        delta_on_fail: 0,
        passes: |p| !p.has_insecure_source(),
        fail_reason: "Plaintext or wildcard sources let untrusted origins deliver code",
        recommendation: "Serve all sources over https and enumerate script origins explicitly",
    },
    Check {
        name: "CSP: object-src restricted",
        high: false,
        delta_on_fail: -2,
        passes: |p| {
            p.directives
                .get("object-src")
                .or_else(|| p.directives.get("default-src"))
                .map(|sources| sources.iter().any(|s| s == "'none'" || s == "'self'"))
                .unwrap_or(false)
        },
        fail_reason: "Plugin content (object/embed) is not restricted",
        recommendation: "Set object-src 'none'",
    },
    Check {
        name: "CSP: no unsafe-inline styles",
        high: false,
        delta_on_fail: -2,
        passes: |p| !p.style_sources_contain("'unsafe-inline'"),
        fail_reason: "unsafe-inline styles enable CSS-based data exfiltration",
        recommendation: "Move inline styles to stylesheets or use nonces",
    },
    Check {
        name: "CSP: default-src deny-by-default",
        high: false,
        delta_on_fail: -2,
        passes: |p| {
            p.directives
                .get("default-src")
                .map(|sources| sources.iter().any(|s| s == "'none'" || s == "'self'"))
                .unwrap_or(false)
        },
        fail_reason: "Undeclared resource types fall through to a permissive default",
        recommendation: "Set default-src 'self' (or 'none') as the baseline",
    },
    Check {
        name: "CSP: frame-ancestors declared",
        high: false,
        delta_on_fail: -2,
        passes: |p| p.has("frame-ancestors"),
        fail_reason: "Framing is not restricted at the policy level",
        recommendation: "Set frame-ancestors 'none' or an explicit parent list",
    },
    Check {
        name: "CSP: base-uri declared",
        high: false,
        delta_on_fail: -2,
        passes: |p| p.has("base-uri"),
        fail_reason: "An injected <base> tag can redirect every relative URL",
        recommendation: "Set base-uri 'self'",
    },
    Check {
        name: "CSP: form-action declared",
        high: false,
        delta_on_fail: -2,
        passes: |p| p.has("form-action"),
        fail_reason: "Injected forms may submit captured input to any origin",
        recommendation: "Set form-action 'self'",
    },
];

/// Evaluate the Content-Security-Policy of one response. A missing header
/// and a policy failing any high-impact check are scored identically:
/// both leave script execution effectively unrestricted.
pub fn evaluate_csp(headers: &HashMap<String, String>) -> Vec<SecurityTest> {
    let Some(raw) = headers.get("content-security-policy") else {
        return vec![SecurityTest::failed(
            AGGREGATE,
            MISSING_OR_DEGRADED_DELTA,
            "No Content-Security-Policy header; script execution is unrestricted",
            "Deploy a CSP with script-src 'self' and nonce-based inline scripts",
        )];
    };

    let policy = Policy::parse(raw);
    let mut tests = Vec::with_capacity(CHECKS.len() + 2);
    let mut high_failures: Vec<&str> = Vec::new();

    for check in CHECKS {
        if (check.passes)(&policy) {
            tests.push(SecurityTest::passed(check.name, "Directive check passed"));
        } else {
            if check.high {
                high_failures.push(check.name);
            }
            tests.push(SecurityTest::failed(
                check.name,
                check.delta_on_fail,
                check.fail_reason,
                check.recommendation,
            ));
        }
    }

    // Adoption check, not a deduction: absence is merely noted
    if policy.script_sources_contain("'strict-dynamic'") {
        tests.push(SecurityTest::info(
            "CSP: strict-dynamic adopted",
            2,
            "strict-dynamic with nonces supersedes host allowlists",
        ));
    } else {
        tests.push(SecurityTest::info(
            "CSP: strict-dynamic adopted",
            0,
            "Policy relies on host allowlists without strict-dynamic",
        ));
    }

    let aggregate = if high_failures.is_empty() {
        SecurityTest::passed(AGGREGATE, "Policy restricts script execution")
    } else {
        SecurityTest::failed(
            AGGREGATE,
            MISSING_OR_DEGRADED_DELTA,
            "Policy is present but degraded to the point of not restricting scripts",
            "Fix the failing script-source checks; a bypassed policy scores as no policy",
        )
        .with_details(json!({ "failedChecks": high_failures }))
    };
    tests.insert(0, aggregate);

    tests
}
