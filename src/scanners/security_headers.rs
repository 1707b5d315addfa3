// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Header Analysis
 * Response header configuration checks feeding the scoring engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::payloads::KNOWN_CDN_HOSTS;
use crate::types::SecurityTest;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::collections::HashMap;
use url::Url;

/// Six months, the common HSTS preload floor
const MIN_HSTS_MAX_AGE: u64 = 15_552_000;

static SCRIPT_SRC_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<script[^>]+src=["']([^"']+)["']"#).unwrap());

fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers.get(name).map(|s| s.as_str())
}

fn hsts_test(headers: &HashMap<String, String>, url: &str) -> SecurityTest {
    let name = "Strict-Transport-Security";

    let is_https = Url::parse(url)
        .map(|u| u.scheme() == "https")
        .unwrap_or(false);
    if !is_https {
        return SecurityTest::not_applicable(name, "Target is not served over HTTPS");
    }

    let Some(value) = header(headers, "strict-transport-security") else {
        return SecurityTest::failed(
            name,
            -10,
            "No HSTS header; first visits can be downgraded to plain HTTP",
            "Set Strict-Transport-Security: max-age=31536000; includeSubDomains",
        );
    };

    let max_age = value
        .to_lowercase()
        .split(';')
        .find_map(|part| part.trim().strip_prefix("max-age=").map(str::to_string))
        .and_then(|v| v.parse::<u64>().ok());

    match max_age {
        Some(age) if age >= MIN_HSTS_MAX_AGE => {
            if value.to_lowercase().contains("includesubdomains") {
                SecurityTest::passed(name, "HSTS enforced with an adequate max-age")
            } else {
                SecurityTest::failed(
                    name,
                    -2,
                    "HSTS max-age is adequate but subdomains are left uncovered",
                    "Add includeSubDomains so every host under the domain is pinned",
                )
            }
        }
        Some(age) => SecurityTest::failed(
            name,
            -5,
            &format!("HSTS max-age {age} is below the six-month floor"),
            "Raise max-age to at least 15552000 seconds",
        )
        .with_details(json!({ "maxAge": age })),
        None => SecurityTest::failed(
            name,
            -5,
            "HSTS header present but max-age is missing or unparsable",
            "Set a numeric max-age of at least 15552000 seconds",
        ),
    }
}

fn content_type_options_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "X-Content-Type-Options";
    match header(headers, "x-content-type-options") {
        Some(v) if v.trim().eq_ignore_ascii_case("nosniff") => {
            SecurityTest::passed(name, "MIME sniffing disabled")
        }
        _ => SecurityTest::failed(
            name,
            -5,
            "MIME sniffing is not disabled",
            "Set X-Content-Type-Options: nosniff",
        ),
    }
}

fn frame_options_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "X-Frame-Options";
    if header(headers, "x-frame-options").is_some() {
        return SecurityTest::passed(name, "Framing restricted by X-Frame-Options");
    }
    // frame-ancestors is the modern replacement
    if header(headers, "content-security-policy")
        .map(|csp| csp.to_lowercase().contains("frame-ancestors"))
        .unwrap_or(false)
    {
        return SecurityTest::passed(name, "Framing restricted by CSP frame-ancestors");
    }
    SecurityTest::failed(
        name,
        -5,
        "Page can be framed by any origin, enabling clickjacking",
        "Set X-Frame-Options: DENY or a CSP frame-ancestors directive",
    )
}

fn referrer_policy_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "Referrer-Policy";
    match header(headers, "referrer-policy") {
        Some(_) => SecurityTest::passed(name, "Referrer policy declared"),
        None => SecurityTest::failed(
            name,
            -3,
            "Full URLs leak to third parties via the Referer header",
            "Set Referrer-Policy: strict-origin-when-cross-origin",
        ),
    }
}

fn xss_protection_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "X-XSS-Protection";
    match header(headers, "x-xss-protection") {
        // The legacy auditor this header controls introduced its own
        // vulnerabilities and is removed from current browsers
        Some(v) => SecurityTest::info(
            name,
            -1,
            &format!("Deprecated header present ({v}); remove it and rely on CSP"),
        ),
        None => SecurityTest::passed(name, "Deprecated header not in use"),
    }
}

fn cors_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "CORS-Policy";
    let origin = header(headers, "access-control-allow-origin");
    let credentials = header(headers, "access-control-allow-credentials")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    match origin {
        Some("*") if credentials => SecurityTest::failed(
            name,
            -25,
            "Wildcard origin combined with credentials exposes authenticated responses to every site",
            "Never combine Access-Control-Allow-Origin: * with Allow-Credentials; echo an allowlisted origin instead",
        ),
        Some("*") => SecurityTest::failed(
            name,
            -8,
            "Any origin may read responses from this host",
            "Restrict Access-Control-Allow-Origin to an explicit allowlist",
        ),
        Some(origin) => SecurityTest::passed(name, "CORS restricted to a specific origin")
            .with_details(json!({ "allowOrigin": origin })),
        None => SecurityTest::not_applicable(name, "No CORS headers on this response"),
    }
}

fn permissions_policy_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "Permissions-Policy";
    match header(headers, "permissions-policy") {
        Some(v) if v.contains('*') => SecurityTest::failed(
            name,
            -4,
            "Permissions-Policy grants powerful features to all origins",
            "Scope each feature to self or an explicit origin list",
        ),
        Some(_) => SecurityTest::passed(name, "Browser feature access is scoped"),
        None => SecurityTest::failed(
            name,
            -3,
            "Browser features (camera, geolocation, ...) are not restricted",
            "Declare a Permissions-Policy disabling unused features",
        ),
    }
}

fn cross_origin_isolation_test(headers: &HashMap<String, String>) -> SecurityTest {
    let name = "Cross-Origin-Isolation";
    let coop = header(headers, "cross-origin-opener-policy").is_some();
    let coep = header(headers, "cross-origin-embedder-policy").is_some();

    match (coop, coep) {
        (true, true) => SecurityTest::info(name, 2, "COOP and COEP enable cross-origin isolation"),
        (false, false) => SecurityTest::info(
            name,
            -2,
            "Neither COOP nor COEP is set; the page is not cross-origin isolated",
        ),
        _ => SecurityTest::info(
            name,
            -2,
            "Only one of COOP/COEP is set; isolation requires both",
        ),
    }
}

/// Third-party scripts outside the known-CDN allowlist widen the supply
/// chain; reported as informational, not as a vulnerability.
fn third_party_scripts_test(body: &str, url: &str) -> SecurityTest {
    let name = "Third-Party-Scripts";
    let page_host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()));

    let mut foreign: Vec<String> = Vec::new();
    for cap in SCRIPT_SRC_ATTR.captures_iter(body) {
        let Ok(src) = Url::parse(&cap[1]) else {
            continue;
        };
        let Some(host) = src.host_str() else { continue };
        if Some(host) == page_host.as_deref() {
            continue;
        }
        if KNOWN_CDN_HOSTS.contains(&host) {
            continue;
        }
        if !foreign.contains(&host.to_string()) {
            foreign.push(host.to_string());
        }
    }

    if foreign.is_empty() {
        SecurityTest::passed(name, "No scripts loaded from unrecognized origins")
    } else {
        SecurityTest::info(
            name,
            -2,
            &format!(
                "Scripts loaded from unrecognized origins: {}",
                foreign.join(", ")
            ),
        )
        .with_details(json!({ "hosts": foreign }))
    }
}

/// Run every header check against one response. Pure over its inputs so
/// the whole battery is table-testable without a network.
pub fn analyze_headers(
    headers: &HashMap<String, String>,
    body: &str,
    url: &str,
) -> Vec<SecurityTest> {
    vec![
        hsts_test(headers, url),
        content_type_options_test(headers),
        frame_options_test(headers),
        referrer_policy_test(headers),
        xss_protection_test(headers),
        cors_test(headers),
        permissions_policy_test(headers),
        cross_origin_isolation_test(headers),
        third_party_scripts_test(body, url),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestOutcome;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const URL: &str = "https://example.com/";

    #[test]
    fn test_missing_hsts_on_https() {
        let t = hsts_test(&headers(&[]), URL);
        assert!(!t.passed);
        assert_eq!(t.score_delta, -10);
    }

    #[test]
    fn test_hsts_not_applicable_on_http() {
        let t = hsts_test(&headers(&[]), "http://example.com/");
        assert_eq!(t.outcome, TestOutcome::NotApplicable);
        assert_eq!(t.score_delta, 0);
    }

    #[test]
    fn test_weak_hsts_max_age() {
        let t = hsts_test(
            &headers(&[("strict-transport-security", "max-age=3600")]),
            URL,
        );
        assert_eq!(t.score_delta, -5);

        let t = hsts_test(
            &headers(&[("strict-transport-security", "max-age=31536000; includeSubDomains")]),
            URL,
        );
        assert!(t.passed);
    }

    #[test]
    fn test_hsts_without_subdomain_coverage() {
        let t = hsts_test(
            &headers(&[("strict-transport-security", "max-age=31536000")]),
            URL,
        );
        assert!(!t.passed);
        assert_eq!(t.score_delta, -2);
    }

    #[test]
    fn test_nosniff() {
        assert!(content_type_options_test(&headers(&[("x-content-type-options", "nosniff")])).passed);
        assert_eq!(content_type_options_test(&headers(&[])).score_delta, -5);
    }

    #[test]
    fn test_frame_ancestors_substitutes_for_xfo() {
        let t = frame_options_test(&headers(&[(
            "content-security-policy",
            "default-src 'self'; frame-ancestors 'none'",
        )]));
        assert!(t.passed);

        assert_eq!(frame_options_test(&headers(&[])).score_delta, -5);
    }

    #[test]
    fn test_cors_wildcard_with_credentials_is_worst_cors_outcome() {
        let wildcard = cors_test(&headers(&[("access-control-allow-origin", "*")]));
        let with_creds = cors_test(&headers(&[
            ("access-control-allow-origin", "*"),
            ("access-control-allow-credentials", "true"),
        ]));
        assert_eq!(wildcard.score_delta, -8);
        assert_eq!(with_creds.score_delta, -25);
        assert!(with_creds.score_delta < wildcard.score_delta);
    }

    #[test]
    fn test_deprecated_xss_protection_penalized() {
        let t = xss_protection_test(&headers(&[("x-xss-protection", "1; mode=block")]));
        assert_eq!(t.score_delta, -1);
        assert!(xss_protection_test(&headers(&[])).passed);
    }

    #[test]
    fn test_cross_origin_isolation_bonus() {
        let t = cross_origin_isolation_test(&headers(&[
            ("cross-origin-opener-policy", "same-origin"),
            ("cross-origin-embedder-policy", "require-corp"),
        ]));
        assert_eq!(t.score_delta, 2);

        assert_eq!(cross_origin_isolation_test(&headers(&[])).score_delta, -2);
    }

    #[test]
    fn test_third_party_scripts_cdn_allowlisted() {
        let body = r#"<script src="https://cdn.jsdelivr.net/npm/x.js"></script>
            <script src="https://example.com/app.js"></script>"#;
        assert!(third_party_scripts_test(body, URL).passed);

        let body = r#"<script src="https://tracker.example.net/t.js"></script>"#;
        let t = third_party_scripts_test(body, URL);
        assert_eq!(t.score_delta, -2);
        assert!(t.reason.contains("tracker.example.net"));
    }

    #[test]
    fn test_full_battery_size() {
        let tests = analyze_headers(&headers(&[]), "", URL);
        assert_eq!(tests.len(), 9);
    }
}
