// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - SQL Injection Tester
 * Error-based probing with per-endpoint baseline comparison
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{inject_param, param_names, TesterTarget};
use crate::payloads::{SqlErrorSignature, SQLI_PAYLOADS, SQL_ERROR_SIGNATURES};
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use tracing::{debug, info};

/// A signature only counts when the baseline response does not already
/// contain it; pages quoting SQL in documentation or error logs would
/// otherwise false-positive on every probe.
fn new_signature(probed: &str, baseline: &str) -> Option<&'static SqlErrorSignature> {
    SQL_ERROR_SIGNATURES
        .iter()
        .find(|sig| probed.contains(sig.pattern) && !baseline.contains(sig.pattern))
}

fn build_finding(
    sig: &SqlErrorSignature,
    surface: &str,
    payload: &str,
    location: &str,
) -> Option<Finding> {
    let r = rule("sqli-error")?;
    Some(r.finding(
        Confidence::High,
        format!(
            "{surface} triggers a {} error when probed with {payload:?}",
            sig.family
        ),
        location.to_string(),
        Some(sig.pattern.to_string()),
    ))
}

async fn probe_endpoint(target: &TesterTarget, endpoint: &str) -> Vec<Finding> {
    let Ok(baseline) = target.get(endpoint).await else {
        debug!("[SQLi] No baseline for {}, skipping", endpoint);
        return Vec::new();
    };

    let mut findings = Vec::new();
    'params: for param in param_names(endpoint) {
        for payload in SQLI_PAYLOADS {
            if target.cancelled() {
                break 'params;
            }
            let Some(url) = inject_param(endpoint, &param, payload) else {
                continue;
            };
            let Ok(resp) = target.get(&url).await else {
                continue;
            };
            if let Some(sig) = new_signature(&resp.body, &baseline.body) {
                info!(
                    "[SQLi] {} error signature on {} via parameter '{}'",
                    sig.family, endpoint, param
                );
                findings.extend(build_finding(
                    sig,
                    &format!("Parameter '{param}'"),
                    payload,
                    endpoint,
                ));
                // Next parameter; repeat hits on the same one add nothing
                continue 'params;
            }
        }
    }
    findings
}

async fn probe_form(target: &TesterTarget, form_index: usize) -> Vec<Finding> {
    let form = &target.forms[form_index];
    let action = if form.action.is_empty() {
        form.page_url.clone()
    } else {
        form.action.clone()
    };

    let benign: Vec<(String, String)> = form
        .fields
        .iter()
        .map(|name| (name.clone(), "1".to_string()))
        .collect();
    let baseline = if form.method.eq_ignore_ascii_case("GET") {
        match super::with_query(&action, &benign) {
            Some(url) => target.get(&url).await,
            None => return Vec::new(),
        }
    } else {
        target.post_form(&action, &benign).await
    };
    let Ok(baseline) = baseline else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    'fields: for field in &form.fields {
        for payload in SQLI_PAYLOADS {
            if target.cancelled() {
                break 'fields;
            }
            let body: Vec<(String, String)> = form
                .fields
                .iter()
                .map(|name| {
                    let value = if name == field { payload.to_string() } else { "1".to_string() };
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
            if let Some(sig) = new_signature(&resp.body, &baseline.body) {
                info!(
                    "[SQLi] {} error signature on form {} via field '{}'",
                    sig.family, action, field
                );
                findings.extend(build_finding(
                    sig,
                    &format!("Form field '{field}'"),
                    payload,
                    &action,
                ));
                continue 'fields;
            }
        }
    }
    findings
}

pub async fn run(target: &TesterTarget) -> Vec<Finding> {
    let mut findings = Vec::new();

    for endpoint in &target.endpoints {
        if target.cancelled() {
            break;
        }
        findings.extend(probe_endpoint(target, endpoint).await);
    }

    for index in 0..target.forms.len() {
        if target.cancelled() {
            break;
        }
        findings.extend(probe_form(target, index).await);
    }

    debug!("[SQLi] Tester finished with {} findings", findings.len());
    findings
}
