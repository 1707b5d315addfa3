// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Authentication Bypass Tester
 * Unauthenticated access, token tampering and parameter-based bypass
 * checks against declared protected pages
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::TesterTarget;
use crate::config::AuthConfig;
use crate::http_client::HttpResponse;
use crate::payloads::AUTH_BYPASS_PARAMS;
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use rand::Rng;
use tracing::{debug, info, warn};
use url::Url;

/// Bodies below this are error stubs or empty shells, not protected
/// content
const MIN_CONTENT_LENGTH: usize = 100;

/// A 200 with a substantial body that does not look like a login prompt
/// counts as access to protected content
fn looks_authenticated(resp: &HttpResponse) -> bool {
    if resp.status_code != 200 {
        return false;
    }
    if resp.body.trim().len() < MIN_CONTENT_LENGTH {
        return false;
    }
    let lower = resp.body.to_lowercase();
    !(lower.contains("type=\"password\"") || lower.contains("type='password'"))
}

/// Derive the form field name from a CSS selector like `#username`,
/// `.user` or `input[name="username"]`
fn field_from_selector(selector: &str) -> String {
    if let Some(start) = selector.find("name=") {
        let rest = &selector[start + 5..];
        return rest
            .trim_start_matches(['"', '\''])
            .chars()
            .take_while(|c| !matches!(c, '"' | '\'' | ']'))
            .collect();
    }
    selector.trim_start_matches(['#', '.']).to_string()
}

/// Best-effort login to learn the real session cookie name. Failure is
/// fine; the tampering check falls back to a generic cookie.
async fn session_cookie_name(target: &TesterTarget, auth: &AuthConfig) -> Option<String> {
    let form = vec![
        (field_from_selector(&auth.username_selector), auth.username.clone()),
        (field_from_selector(&auth.password_selector), auth.password.clone()),
    ];

    let resp = target.post_form(&auth.login_url, &form).await.ok()?;
    let set_cookie = resp.header("set-cookie")?;
    let name = set_cookie.split('\n').next()?.split('=').next()?.trim();
    if name.is_empty() {
        None
    } else {
        debug!("[Auth] Login issued session cookie '{}'", name);
        Some(name.to_string())
    }
}

fn with_param(url: &str, param: &str, value: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    parsed.query_pairs_mut().append_pair(param, value);
    Some(parsed.to_string())
}

async fn check_page(
    target: &TesterTarget,
    page: &str,
    cookie_name: &str,
    findings: &mut Vec<Finding>,
) {
    // Check 1: the page must not be served without credentials
    target.gate.wait_for_slot(page).await;
    let Ok(baseline) = target.http.get_unauthenticated(page).await else {
        warn!("[Auth] Could not reach protected page {}", page);
        return;
    };

    if looks_authenticated(&baseline) {
        info!("[Auth] {} is served without authentication", page);
        if let Some(r) = rule("auth-unprotected-page") {
            findings.push(r.finding(
                Confidence::High,
                "Protected page is served in full without any credentials".to_string(),
                page.to_string(),
                Some(format!("HTTP {} for unauthenticated GET", baseline.status_code)),
            ));
        }
        // Access controls are absent; the remaining checks add nothing
        return;
    }

    // Check 2: a tampered session token must be rejected. The forged
    // cookie replaces the scan session entirely; sending it alongside the
    // real cookie would let the server authenticate via the genuine one.
    let garbage: String = {
        let mut rng = rand::rng();
        (0..32).map(|_| format!("{:x}", rng.random::<u8>() & 0xf)).collect()
    };
    let tampered = [("Cookie".to_string(), format!("{cookie_name}={garbage}"))];
    target.gate.wait_for_slot(page).await;
    if let Ok(resp) = target.http.get_unauthenticated_with_headers(page, &tampered).await {
        if looks_authenticated(&resp) {
            info!("[Auth] {} accepts a tampered session token", page);
            if let Some(r) = rule("auth-token-not-validated") {
                findings.push(r.finding(
                    Confidence::High,
                    format!("Protected page accepts a forged '{cookie_name}' session token"),
                    page.to_string(),
                    Some(format!("HTTP {} with random token", resp.status_code)),
                ));
            }
        }
    }

    // Check 3: client-supplied parameters must not unlock the page
    for (param, value) in AUTH_BYPASS_PARAMS {
        if target.cancelled() {
            return;
        }
        let Some(url) = with_param(page, param, value) else {
            continue;
        };
        target.gate.wait_for_slot(&url).await;
        let Ok(resp) = target.http.get_unauthenticated(&url).await else {
            continue;
        };
        if looks_authenticated(&resp) {
            info!("[Auth] {} unlocked by ?{}={}", page, param, value);
            if let Some(r) = rule("auth-bypass-parameter") {
                findings.push(r.finding(
                    Confidence::High,
                    format!("Blocked page becomes accessible with ?{param}={value}"),
                    page.to_string(),
                    Some(format!("HTTP {} with bypass parameter", resp.status_code)),
                ));
            }
            break;
        }
    }
}

pub async fn run(target: &TesterTarget) -> Vec<Finding> {
    let Some(auth) = &target.auth else {
        debug!("[Auth] No auth configuration, tester skipped");
        return Vec::new();
    };

    let cookie_name = session_cookie_name(target, auth)
        .await
        .unwrap_or_else(|| "session".to_string());

    let mut findings = Vec::new();
    for page in &auth.protected_pages {
        if target.cancelled() {
            break;
        }
        check_page(target, page, &cookie_name, &mut findings).await;
    }

    debug!("[Auth] Tester finished with {} findings", findings.len());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status_code: status,
            body: body.to_string(),
            headers: HashMap::new(),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_login_prompt_not_counted_as_access() {
        let resp = response(200, r#"<form><input type="password" name="pw"></form>"#);
        assert!(!looks_authenticated(&resp));
    }

    #[test]
    fn test_content_page_counted_as_access() {
        let body = format!(
            "<html><body><h1>Account balance</h1><p>1,234.56</p>{}</body></html>",
            "<p>transaction row</p>".repeat(10)
        );
        assert!(looks_authenticated(&response(200, &body)));
    }

    #[test]
    fn test_redirect_and_denied_not_counted() {
        assert!(!looks_authenticated(&response(302, "")));
        assert!(!looks_authenticated(&response(401, "denied")));
        assert!(!looks_authenticated(&response(403, "forbidden")));
    }

    #[test]
    fn test_trivial_200_body_not_counted_as_access() {
        assert!(!looks_authenticated(&response(200, "")));
        assert!(!looks_authenticated(&response(200, "   \n  ")));
        assert!(!looks_authenticated(&response(200, "<html>Not found</html>")));
    }

    #[test]
    fn test_field_from_selector() {
        assert_eq!(field_from_selector("#username"), "username");
        assert_eq!(field_from_selector(".user"), "user");
        assert_eq!(field_from_selector(r#"input[name="login"]"#), "login");
        assert_eq!(field_from_selector("input[name=email]"), "email");
    }

    #[test]
    fn test_with_param_appends_query() {
        assert_eq!(
            with_param("https://example.com/admin", "admin", "true").unwrap(),
            "https://example.com/admin?admin=true"
        );
        assert_eq!(
            with_param("https://example.com/a?x=1", "debug", "true").unwrap(),
            "https://example.com/a?x=1&debug=true"
        );
    }
}
