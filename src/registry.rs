// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Detection Rule Registry
 * Single source of truth mapping rule ids to severity, category,
 * remediation and taxonomy id
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{Confidence, Finding, Severity};

/// One detection rule. Declarative so rules stay independently testable.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub cwe: &'static str,
    pub remediation: &'static str,
}

pub static RULES: &[Rule] = &[
    // Static script analysis
    Rule {
        id: "eval-usage",
        category: "Code Injection",
        severity: Severity::Critical,
        cwe: "CWE-95",
        remediation: "Remove eval() and parse untrusted input with JSON.parse or a dedicated parser. If dynamic evaluation is unavoidable, isolate it behind a sandboxed worker.",
    },
    Rule {
        id: "function-constructor",
        category: "Code Injection",
        severity: Severity::Critical,
        cwe: "CWE-95",
        remediation: "Replace new Function() with statically defined functions. Dynamic code construction from strings executes with full page privileges.",
    },
    Rule {
        id: "inner-html-assignment",
        category: "Cross-Site Scripting",
        severity: Severity::High,
        cwe: "CWE-79",
        remediation: "Use textContent for text, or sanitize markup with DOMPurify before assigning to innerHTML.",
    },
    Rule {
        id: "dangerous-html-sink",
        category: "Cross-Site Scripting",
        severity: Severity::High,
        cwe: "CWE-79",
        remediation: "Avoid framework escape hatches (dangerouslySetInnerHTML, v-html, bypassSecurityTrust*). Render user data through the framework's default escaping.",
    },
    Rule {
        id: "hardcoded-secret",
        category: "Sensitive Data Exposure",
        severity: Severity::Critical,
        cwe: "CWE-798",
        remediation: "Remove the credential from source, rotate it immediately, and load secrets from the environment or a secret manager at runtime.",
    },
    // Static markup analysis
    Rule {
        id: "form-missing-action",
        category: "Insecure Form",
        severity: Severity::Low,
        cwe: "CWE-20",
        remediation: "Declare an explicit same-origin action attribute on every form so submissions cannot be hijacked by injected base URIs.",
    },
    Rule {
        id: "form-insecure-action",
        category: "Insecure Form",
        severity: Severity::High,
        cwe: "CWE-319",
        remediation: "Point form actions at https:// endpoints. Credentials submitted over plain HTTP are readable in transit.",
    },
    Rule {
        id: "form-foreign-action",
        category: "Insecure Form",
        severity: Severity::Medium,
        cwe: "CWE-20",
        remediation: "Review forms posting to a foreign origin; user data should only be submitted to origins you control.",
    },
    Rule {
        id: "inline-script-no-nonce",
        category: "Content Security",
        severity: Severity::Low,
        cwe: "CWE-79",
        remediation: "Give inline scripts a CSP nonce or move them to same-origin files so a strict Content-Security-Policy can be enforced.",
    },
    // Dependency analysis
    Rule {
        id: "vulnerable-dependency",
        category: "Vulnerable Component",
        severity: Severity::High,
        cwe: "CWE-1395",
        remediation: "Upgrade the affected package to the fixed version or later. Pin the resolved version in the lockfile.",
    },
    Rule {
        id: "outdated-dependency",
        category: "Vulnerable Component",
        severity: Severity::Low,
        cwe: "CWE-1104",
        remediation: "Upgrade to a currently maintained major version to keep receiving security patches.",
    },
    // Dynamic testers
    Rule {
        id: "xss-reflected",
        category: "Cross-Site Scripting",
        severity: Severity::High,
        cwe: "CWE-79",
        remediation: "Encode output for its HTML context and set a Content-Security-Policy. Never interpolate request parameters into script, attribute, or URL contexts.",
    },
    Rule {
        id: "sqli-error",
        category: "SQL Injection",
        severity: Severity::Critical,
        cwe: "CWE-89",
        remediation: "Use parameterized queries / prepared statements for every database access. Disable verbose database errors in production responses.",
    },
    Rule {
        id: "path-traversal",
        category: "Path Traversal",
        severity: Severity::Critical,
        cwe: "CWE-22",
        remediation: "Resolve user-supplied paths against an allowlisted base directory and reject any resolved path escaping it. Do not pass raw parameters to filesystem APIs.",
    },
    Rule {
        id: "csrf-missing-token",
        category: "CSRF",
        severity: Severity::High,
        cwe: "CWE-352",
        remediation: "Add a synchronizer token to every state-changing form and validate it server-side on submission.",
    },
    Rule {
        id: "csrf-weak-token",
        category: "CSRF",
        severity: Severity::Medium,
        cwe: "CWE-352",
        remediation: "Generate CSRF tokens with a CSPRNG, at least 16 characters, unique per session.",
    },
    Rule {
        id: "cookie-samesite",
        category: "CSRF",
        severity: Severity::Medium,
        cwe: "CWE-1275",
        remediation: "Set SameSite=Lax or Strict (plus Secure and HttpOnly) on session cookies.",
    },
    Rule {
        id: "auth-unprotected-page",
        category: "Authentication Bypass",
        severity: Severity::Critical,
        cwe: "CWE-306",
        remediation: "Enforce authentication server-side on every protected route. Client-side route guards are not access control.",
    },
    Rule {
        id: "auth-token-not-validated",
        category: "Authentication Bypass",
        severity: Severity::Critical,
        cwe: "CWE-287",
        remediation: "Validate session tokens cryptographically on every request and reject tampered or expired tokens with a 401.",
    },
    Rule {
        id: "auth-bypass-parameter",
        category: "Authentication Bypass",
        severity: Severity::High,
        cwe: "CWE-639",
        remediation: "Never derive authorization from client-supplied parameters. Authorization state belongs in the server-side session.",
    },
];

/// Look up a rule by id
pub fn rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}

impl Rule {
    /// Build a Finding from this rule. Severity/category/remediation come
    /// from the registry so the table stays the single source of truth.
    pub fn finding(
        &self,
        confidence: Confidence,
        description: String,
        location: String,
        evidence: Option<String>,
    ) -> Finding {
        Finding {
            id: crate::types::new_finding_id(self.id),
            rule_id: self.id.to_string(),
            category: self.category.to_string(),
            severity: self.severity,
            confidence,
            description,
            location,
            remediation: self.remediation.to_string(),
            evidence,
            discovered_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
