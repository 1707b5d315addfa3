// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Markup Analyzer
 * Form hygiene and inline-script checks over crawled HTML
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use super::{ResponseContext, StaticAnalyzer};
use crate::registry::rule;
use crate::types::{Confidence, Finding};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static FORM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("form").unwrap());
static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

pub struct MarkupAnalyzer;

impl MarkupAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkupAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticAnalyzer for MarkupAnalyzer {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn analyze(
        &self,
        source: &str,
        locator: &str,
        _ctx: Option<&ResponseContext>,
    ) -> Vec<Finding> {
        let document = Html::parse_document(source);
        let page_host = Url::parse(locator)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()));
        let mut findings = Vec::new();

        for form in document.select(&FORM_SELECTOR) {
            let action = form.value().attr("action").map(str::trim).unwrap_or("");

            if action.is_empty() {
                if let Some(r) = rule("form-missing-action") {
                    findings.push(r.finding(
                        Confidence::Medium,
                        "Form without an explicit action attribute submits to the current URL".to_string(),
                        locator.to_string(),
                        None,
                    ));
                }
                continue;
            }

            if action.starts_with("http://") {
                if let Some(r) = rule("form-insecure-action") {
                    findings.push(r.finding(
                        Confidence::High,
                        "Form submits over unencrypted HTTP".to_string(),
                        locator.to_string(),
                        Some(format!("action=\"{action}\"")),
                    ));
                }
            }

            // Foreign origin only decidable for absolute actions
            if let (Some(page_host), Ok(action_url)) = (&page_host, Url::parse(action)) {
                if let Some(action_host) = action_url.host_str() {
                    if action_host != page_host {
                        if let Some(r) = rule("form-foreign-action") {
                            findings.push(r.finding(
                                Confidence::Medium,
                                format!("Form posts user data to foreign origin {action_host}"),
                                locator.to_string(),
                                Some(format!("action=\"{action}\"")),
                            ));
                        }
                    }
                }
            }
        }

        // Advisory, reported once per page no matter how many inline blocks
        let has_unnonced_inline = document.select(&SCRIPT_SELECTOR).any(|s| {
            s.value().attr("src").is_none()
                && s.value().attr("nonce").is_none()
                && !s.text().collect::<String>().trim().is_empty()
        });
        if has_unnonced_inline {
            if let Some(r) = rule("inline-script-no-nonce") {
                findings.push(r.finding(
                    Confidence::Low,
                    "Inline script without a CSP nonce prevents a strict script-src policy".to_string(),
                    locator.to_string(),
                    None,
                ));
            }
        }

        debug!("[Markup] {} findings in {}", findings.len(), locator);
        findings
    }
}
