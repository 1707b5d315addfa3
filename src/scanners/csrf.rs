// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CSRF Tester
 * Anti-forgery token and cookie SameSite inspection of state-changing forms
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::TesterTarget;
use crate::payloads::CSRF_TOKEN_NAMES;
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info};

const MIN_TOKEN_LENGTH: usize = 16;

/// Fewer distinct characters than this means the token is repetitive
/// filler, not random material
const MIN_TOKEN_DISTINCT_CHARS: usize = 5;

fn is_token_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    CSRF_TOKEN_NAMES.iter().any(|t| lower.contains(t))
}

fn is_low_entropy(value: &str) -> bool {
    let distinct: HashSet<char> = value.chars().collect();
    distinct.len() < MIN_TOKEN_DISTINCT_CHARS
}

/// Inspect every state-changing form in a fetched page. GET forms are
/// idempotent by contract and never flagged.
fn inspect_forms(html: &str, page_url: &str) -> Vec<Finding> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").unwrap();
    let input_selector = Selector::parse("input").unwrap();

    let mut findings = Vec::new();
    for form in document.select(&form_selector) {
        let method = form.value().attr("method").unwrap_or("GET");
        if method.eq_ignore_ascii_case("GET") {
            continue;
        }
        let action = form.value().attr("action").unwrap_or("").to_string();

        let token = form.select(&input_selector).find(|input| {
            input
                .value()
                .attr("name")
                .map(is_token_name)
                .unwrap_or(false)
        });

        match token {
            None => {
                info!("[CSRF] No anti-forgery token in form '{}' on {}", action, page_url);
                if let Some(r) = rule("csrf-missing-token") {
                    findings.push(r.finding(
                        Confidence::High,
                        "State-changing form carries no anti-forgery token".to_string(),
                        page_url.to_string(),
                        Some(format!("<form action=\"{action}\" method=\"{method}\">")),
                    ));
                }
            }
            Some(input) => {
                let value = input.value().attr("value").unwrap_or("");
                let name = input.value().attr("name").unwrap_or("");
                let weakness = if value.len() < MIN_TOKEN_LENGTH {
                    Some(format!(
                        "Anti-forgery token '{name}' is only {} characters",
                        value.len()
                    ))
                } else if is_low_entropy(value) {
                    Some(format!(
                        "Anti-forgery token '{name}' is repetitive filler with almost no character variety"
                    ))
                } else {
                    None
                };
                if let Some(description) = weakness {
                    info!("[CSRF] Weak token '{}' in form '{}' on {}", name, action, page_url);
                    if let Some(r) = rule("csrf-weak-token") {
                        findings.push(r.finding(
                            Confidence::Medium,
                            description,
                            page_url.to_string(),
                            None,
                        ));
                    }
                }
            }
        }
    }
    findings
}

/// Cookie names that carry authentication state. Preference cookies
/// without SameSite are not a forgery vector.
const SESSION_COOKIE_HINTS: &[&str] = &["session", "auth", "token", "sid"];

fn is_session_cookie(name: &str) -> bool {
    let lower = name.to_lowercase();
    SESSION_COOKIE_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Session cookies set without a SameSite attribute. Set-Cookie lines
/// arrive newline-joined from the response header map.
fn cookies_without_samesite(set_cookie: &str) -> Vec<String> {
    set_cookie
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.to_lowercase().contains("samesite"))
        .filter_map(|line| line.split('=').next())
        .map(|name| name.trim().to_string())
        .filter(|name| is_session_cookie(name))
        .collect()
}

pub async fn run(target: &TesterTarget) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut fetched_pages: HashSet<String> = HashSet::new();
    let mut samesite_reported = false;

    for form in target.forms.iter().filter(|f| f.is_state_changing()) {
        if target.cancelled() {
            break;
        }
        // One fetch per hosting page covers all of its forms
        if !fetched_pages.insert(form.page_url.clone()) {
            continue;
        }

        let Ok(resp) = target.get(&form.page_url).await else {
            debug!("[CSRF] Could not re-fetch {}, skipping", form.page_url);
            continue;
        };

        findings.extend(inspect_forms(&resp.body, &form.page_url));

        if !samesite_reported {
            if let Some(set_cookie) = resp.header("set-cookie") {
                let lax = cookies_without_samesite(set_cookie);
                if !lax.is_empty() {
                    samesite_reported = true;
                    if let Some(r) = rule("cookie-samesite") {
                        findings.push(r.finding(
                            Confidence::High,
                            format!(
                                "Session cookies set without a SameSite attribute: {}",
                                lax.join(", ")
                            ),
                            form.page_url.clone(),
                            None,
                        ));
                    }
                }
            }
        }
    }

    debug!("[CSRF] Tester finished with {} findings", findings.len());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_form_without_token_flagged() {
        let html = r#"<form action="/transfer" method="post">
            <input name="amount"><input name="to">
        </form>"#;
        let findings = inspect_forms(html, "https://example.com/transfer");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "csrf-missing-token");
    }

    #[test]
    fn test_get_form_never_flagged() {
        let html = r#"<form action="/search" method="get"><input name="q"></form>"#;
        assert!(inspect_forms(html, "https://example.com/").is_empty());
    }

    #[test]
    fn test_strong_token_passes() {
        let html = r#"<form action="/transfer" method="post">
            <input type="hidden" name="csrf_token" value="f3a9c1d8e2b74065a1b2c3d4e5f60718">
        </form>"#;
        assert!(inspect_forms(html, "https://example.com/").is_empty());
    }

    #[test]
    fn test_short_token_flagged_weak() {
        let html = r#"<form action="/transfer" method="post">
            <input type="hidden" name="authenticity_token" value="abc123">
        </form>"#;
        let findings = inspect_forms(html, "https://example.com/");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "csrf-weak-token");
        assert!(findings[0].description.contains("6 characters"));
    }

    #[test]
    fn test_token_name_conventions_recognized() {
        for name in ["csrfmiddlewaretoken", "_token", "X-CSRF", "__RequestVerificationToken"] {
            assert!(is_token_name(name), "{name} should count as a token field");
        }
        assert!(!is_token_name("amount"));
    }

    #[test]
    fn test_repetitive_token_flagged_weak() {
        let html = r#"<form action="/transfer" method="post">
            <input type="hidden" name="csrf_token" value="aaaaaaaaaaaaaaaa">
        </form>"#;
        let findings = inspect_forms(html, "https://example.com/");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "csrf-weak-token");
        assert!(findings[0].description.contains("character variety"));
    }

    #[test]
    fn test_samesite_check_handles_joined_cookies() {
        let header = "session=abc; Path=/; HttpOnly\ntheme=dark; SameSite=Lax";
        assert_eq!(cookies_without_samesite(header), vec!["session"]);

        let header = "session=abc; SameSite=Strict";
        assert!(cookies_without_samesite(header).is_empty());
    }

    #[test]
    fn test_preference_cookies_ignored_by_samesite_check() {
        let header = "theme=dark; Path=/\nlocale=fi; Path=/";
        assert!(cookies_without_samesite(header).is_empty());

        // JSESSIONID matches the sid convention
        let header = "JSESSIONID=abc; Path=/\ntheme=dark; Path=/";
        assert_eq!(cookies_without_samesite(header), vec!["JSESSIONID"]);
    }
}
