// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Path Traversal Tester
 * Directory escape probing with system-file response signatures
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{inject_param, param_names, TesterTarget};
use crate::payloads::{FILE_PARAM_HINTS, TRAVERSAL_PAYLOADS, TRAVERSAL_SIGNATURES};
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use tracing::{debug, info};

pub(crate) fn is_file_param(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILE_PARAM_HINTS
        .iter()
        .any(|hint| lower == *hint || lower.contains(hint))
}

/// Parameters whose names suggest file access are probed first; the
/// request budget then goes where a hit is most likely
pub(crate) fn prioritized_params(url: &str) -> Vec<String> {
    let mut params = param_names(url);
    params.sort_by_key(|p| !is_file_param(p));
    params
}

fn matched_signature(probed: &str, baseline: &str) -> Option<&'static str> {
    TRAVERSAL_SIGNATURES
        .iter()
        .find(|sig| probed.contains(*sig) && !baseline.contains(*sig))
        .copied()
}

async fn probe_endpoint(target: &TesterTarget, endpoint: &str) -> Option<Finding> {
    let baseline = target.get(endpoint).await.ok()?;

    for param in prioritized_params(endpoint) {
        for payload in TRAVERSAL_PAYLOADS {
            if target.cancelled() {
                return None;
            }
            let url = inject_param(endpoint, &param, payload)?;
            let Ok(resp) = target.get(&url).await else {
                continue;
            };
            if let Some(signature) = matched_signature(&resp.body, &baseline.body) {
                info!(
                    "[Traversal] Parameter '{}' on {} serves file contents for {:?}",
                    param, endpoint, payload
                );
                let r = rule("path-traversal")?;
                return Some(r.finding(
                    Confidence::High,
                    format!(
                        "Parameter '{param}' returns system file contents when probed with {payload:?}"
                    ),
                    endpoint.to_string(),
                    Some(signature.to_string()),
                ));
            }
        }
    }
    None
}

pub async fn run(target: &TesterTarget) -> Vec<Finding> {
    let mut findings = Vec::new();

    for endpoint in &target.endpoints {
        if target.cancelled() {
            break;
        }
        // One confirmed escape per endpoint is enough evidence
        if let Some(finding) = probe_endpoint(target, endpoint).await {
            findings.push(finding);
        }
    }

    debug!("[Traversal] Tester finished with {} findings", findings.len());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_param_hints() {
        assert!(is_file_param("file"));
        assert!(is_file_param("FileName"));
        assert!(is_file_param("template_path"));
        assert!(!is_file_param("q"));
        assert!(!is_file_param("sort"));
    }

    #[test]
    fn test_file_params_probed_first() {
        let params =
            prioritized_params("https://example.com/view?sort=asc&file=report.pdf&q=x");
        assert_eq!(params[0], "file");
    }

    #[test]
    fn test_passwd_signature() {
        let probed = "root:x:0:0:root:/root:/bin/bash\ndaemon:x:1:1:";
        assert_eq!(matched_signature(probed, ""), Some("root:x:0:0:"));
    }

    #[test]
    fn test_win_ini_signature() {
        let probed = "; for 16-bit app support\n[fonts]\n[extensions]";
        assert!(matched_signature(probed, "").is_some());
    }

    #[test]
    fn test_signature_in_baseline_not_counted() {
        let body = "example unix docs: root:x:0:0:";
        assert!(matched_signature(body, body).is_none());
    }
}
