// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - XSS Tester
 * Marker-based reflected XSS probing of endpoints and forms
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{inject_param, param_names, TesterTarget};
use crate::crawler::DiscoveredForm;
use crate::payloads::xss_payloads;
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use rand::Rng;
use tracing::{debug, info};

/// Per-scan random marker so a reflection is attributable to our probe
/// and never to pre-existing page content
pub(crate) fn new_marker() -> String {
    let mut rng = rand::rng();
    format!("vrk{:08x}", rng.random::<u32>())
}

/// Classify where the marker landed. Plain text reflection returns None:
/// an echo is only a vulnerability when it lands in executable syntax.
pub(crate) fn dangerous_context(body: &str, marker: &str) -> Option<&'static str> {
    if body.contains(&format!("<{marker}>")) {
        return Some("an unescaped HTML tag");
    }
    if body.contains(&format!("onerror={marker}("))
        || body.contains(&format!("onload={marker}("))
        || body.contains(&format!("on{marker}="))
    {
        return Some("an event handler attribute");
    }
    if body.contains(&format!("javascript:{marker}")) {
        return Some("a javascript: URI");
    }
    if in_script_block(body, marker) {
        return Some("an executable script block");
    }
    None
}

/// True when any occurrence of the marker sits inside an open <script>
/// region of the response
fn in_script_block(body: &str, marker: &str) -> bool {
    let lower = body.to_lowercase();
    let marker = marker.to_lowercase();

    let mut from = 0;
    while let Some(pos) = lower[from..].find(&marker) {
        let idx = from + pos;
        if let Some(open) = lower[..idx].rfind("<script") {
            if !lower[open..idx].contains("</script") {
                return true;
            }
        }
        from = idx + marker.len();
    }
    false
}

fn snippet_around(body: &str, marker: &str) -> Option<String> {
    let idx = body.find(marker)?;
    let mut start = idx.saturating_sub(40);
    let mut end = (idx + marker.len() + 40).min(body.len());
    // Stay on char boundaries for multi-byte pages
    while !body.is_char_boundary(start) {
        start -= 1;
    }
    while end < body.len() && !body.is_char_boundary(end) {
        end += 1;
    }
    Some(body[start..end].trim().to_string())
}

fn build_finding(context: &'static str, surface: &str, location: &str, body: &str, marker: &str) -> Option<Finding> {
    let r = rule("xss-reflected")?;
    Some(r.finding(
        Confidence::High,
        format!("{surface} reflects unsanitized input into {context}"),
        location.to_string(),
        snippet_around(body, marker),
    ))
}

async fn probe_endpoint_param(
    target: &TesterTarget,
    endpoint: &str,
    param: &str,
    payloads: &[String],
    marker: &str,
) -> Option<Finding> {
    for payload in payloads {
        if target.cancelled() {
            return None;
        }
        let url = inject_param(endpoint, param, payload)?;
        let Ok(resp) = target.get(&url).await else {
            continue;
        };
        if let Some(context) = dangerous_context(&resp.body, marker) {
            info!("[XSS] Parameter '{}' on {} reflects into {}", param, endpoint, context);
            return build_finding(
                context,
                &format!("Parameter '{param}'"),
                endpoint,
                &resp.body,
                marker,
            );
        }
    }
    None
}

async fn probe_form_field(
    target: &TesterTarget,
    form: &DiscoveredForm,
    field: &str,
    payloads: &[String],
    marker: &str,
) -> Option<Finding> {
    let action = if form.action.is_empty() {
        form.page_url.clone()
    } else {
        form.action.clone()
    };

    for payload in payloads {
        if target.cancelled() {
            return None;
        }
        // Benign filler for the other fields so validation does not
        // short-circuit before the template renders
        let body: Vec<(String, String)> = form
            .fields
            .iter()
            .map(|name| {
                let value = if name == field { payload.clone() } else { "1".to_string() };
                (name.clone(), value)
            })
            .collect();

        let resp = if form.method.eq_ignore_ascii_case("GET") {
            let Some(url) = super::with_query(&action, &body) else {
                continue;
            };
            target.get(&url).await
        } else {
            target.post_form(&action, &body).await
        };

        let Ok(resp) = resp else { continue };
        if let Some(context) = dangerous_context(&resp.body, marker) {
            info!("[XSS] Form field '{}' on {} reflects into {}", field, action, context);
            return build_finding(
                context,
                &format!("Form field '{field}'"),
                &action,
                &resp.body,
                marker,
            );
        }
    }
    None
}

pub async fn run(target: &TesterTarget) -> Vec<Finding> {
    let marker = new_marker();
    let payloads = xss_payloads(&marker);
    let mut findings = Vec::new();

    for endpoint in &target.endpoints {
        if target.cancelled() {
            break;
        }
        for param in param_names(endpoint) {
            if let Some(f) =
                probe_endpoint_param(target, endpoint, &param, &payloads, &marker).await
            {
                findings.push(f);
            }
        }
    }

    for form in &target.forms {
        if target.cancelled() {
            break;
        }
        for field in &form.fields {
            if let Some(f) = probe_form_field(target, form, field, &payloads, &marker).await {
                findings.push(f);
                // One confirmed sink per form is enough evidence
                break;
            }
        }
    }

    debug!("[XSS] Tester finished with {} findings", findings.len());
    findings
}
