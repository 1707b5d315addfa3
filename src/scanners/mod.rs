// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Dynamic Testers and Scan Engine
 * Probe orchestration over the crawled surface and end-to-end scan
 * lifecycle
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::analyzers::{
    DependencyAnalyzer, MarkupAnalyzer, ResponseContext, ScriptAnalyzer, StaticAnalyzer,
};
use crate::config::{AuthConfig, CrawlerOptions};
use crate::crawler::{CrawlOutput, DiscoveredForm, WebCrawler};
use crate::errors::ScannerError;
use crate::http_client::{HttpClient, HttpResponse};
use crate::progress::{ProgressEvent, ProgressLevel, ProgressSink, TracingProgress};
use crate::rate_limiter::RequestGate;
use crate::scoring;
use crate::types::{Finding, ScanMode, ScanResults, SecurityTest};
use rand::Rng;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

pub mod auth_bypass;
pub mod csp;
pub mod csrf;
pub mod path_traversal;
pub mod security_headers;
pub mod sqli;
pub mod xss;

pub use csp::evaluate_csp;
pub use security_headers::analyze_headers;

/// Probe budget: the most-parameterized endpoints and forms are tested,
/// the rest of the surface is reported but not probed
pub const MAX_TESTED_ENDPOINTS: usize = 10;
pub const MAX_TESTED_FORMS: usize = 5;

/// Shared probe surface handed to every dynamic tester. Each outbound
/// request waits on the gate first, so tester concurrency can never
/// bypass the per-host rate limit.
pub struct TesterTarget {
    pub root_url: String,
    pub endpoints: Vec<String>,
    pub forms: Vec<DiscoveredForm>,
    pub auth: Option<AuthConfig>,
    pub http: Arc<HttpClient>,
    pub gate: Arc<RequestGate>,
    pub cancel: Arc<AtomicBool>,
}

impl TesterTarget {
    pub fn from_crawl(
        root_url: String,
        crawl: &CrawlOutput,
        auth: Option<AuthConfig>,
        http: Arc<HttpClient>,
        gate: Arc<RequestGate>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        // Sorted before truncation so the tested subset is stable run to run
        let mut endpoints: Vec<String> = crawl.site_map.endpoints.iter().cloned().collect();
        endpoints.sort();
        endpoints.truncate(MAX_TESTED_ENDPOINTS);

        let mut forms = crawl.site_map.forms.clone();
        forms.truncate(MAX_TESTED_FORMS);

        Self {
            root_url,
            endpoints,
            forms,
            auth,
            http,
            gate,
            cancel,
        }
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub async fn get(&self, url: &str) -> anyhow::Result<HttpResponse> {
        self.gate.wait_for_slot(url).await;
        self.http.get(url).await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> anyhow::Result<HttpResponse> {
        self.gate.wait_for_slot(url).await;
        self.http.post_form(url, form).await
    }
}

/// Query parameter names of an endpoint URL
pub(crate) fn param_names(url: &str) -> Vec<String> {
    Url::parse(url)
        .map(|u| u.query_pairs().map(|(k, _)| k.into_owned()).collect())
        .unwrap_or_default()
}

/// Rebuild the URL with one parameter's value replaced by the payload
pub(crate) fn inject_param(url: &str, param: &str, value: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut out = parsed.clone();
    out.set_query(None);
    {
        let mut serializer = out.query_pairs_mut();
        for (k, v) in &pairs {
            if k == param {
                serializer.append_pair(k, value);
            } else {
                serializer.append_pair(k, v);
            }
        }
    }
    Some(out.to_string())
}

/// URL with the given pairs as its query string
pub(crate) fn with_query(url: &str, pairs: &[(String, String)]) -> Option<String> {
    let mut out = Url::parse(url).ok()?;
    out.set_query(None);
    {
        let mut serializer = out.query_pairs_mut();
        for (k, v) in pairs {
            serializer.append_pair(k, v);
        }
    }
    Some(out.to_string())
}

/// The closed set of dynamic testers, run in this declaration order.
/// A closed enum keeps the engine's probe surface auditable; adding a
/// tester is an explicit code change, not a registration side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicTester {
    Xss,
    Sqli,
    PathTraversal,
    Csrf,
    AuthBypass,
}

impl DynamicTester {
    pub const ALL: [DynamicTester; 5] = [
        DynamicTester::Xss,
        DynamicTester::Sqli,
        DynamicTester::PathTraversal,
        DynamicTester::Csrf,
        DynamicTester::AuthBypass,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DynamicTester::Xss => "xss",
            DynamicTester::Sqli => "sqli",
            DynamicTester::PathTraversal => "path-traversal",
            DynamicTester::Csrf => "csrf",
            DynamicTester::AuthBypass => "auth-bypass",
        }
    }

    pub async fn run(&self, target: &TesterTarget) -> Vec<Finding> {
        match self {
            DynamicTester::Xss => xss::run(target).await,
            DynamicTester::Sqli => sqli::run(target).await,
            DynamicTester::PathTraversal => path_traversal::run(target).await,
            DynamicTester::Csrf => csrf::run(target).await,
            DynamicTester::AuthBypass => auth_bypass::run(target).await,
        }
    }
}

/// End-to-end scan orchestrator: crawl, static analysis, dynamic probes,
/// header evaluation, scoring. Session credentials live in the per-scan
/// HTTP client and are dropped with it.
pub struct ScanEngine {
    options: CrawlerOptions,
    progress: Arc<dyn ProgressSink>,
    cancel: Arc<AtomicBool>,
    dependency_manifest: Option<String>,
}

impl ScanEngine {
    pub fn new(options: CrawlerOptions) -> Self {
        Self {
            options,
            progress: Arc::new(TracingProgress),
            cancel: Arc::new(AtomicBool::new(false)),
            dependency_manifest: None,
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// package.json contents analyzed during the static phase
    pub fn with_dependency_manifest(mut self, manifest: String) -> Self {
        self.dependency_manifest = Some(manifest);
        self
    }

    /// Handle for cooperative cancellation. Phases observe the flag at
    /// probe boundaries; the scan returns the results gathered so far.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    fn notify(&self, level: ProgressLevel, phase: &str, message: &str) {
        self.progress.notify(ProgressEvent::now(level, phase, message));
    }

    pub async fn run_scan(
        &self,
        target_url: &str,
        mode: ScanMode,
        auth: Option<AuthConfig>,
    ) -> Result<ScanResults, ScannerError> {
        self.options.validate()?;

        let started = chrono::Utc::now();
        let scan_id = {
            let mut rng = rand::rng();
            format!("scan_{:016x}", rng.random::<u64>())
        };
        self.notify(
            ProgressLevel::Info,
            "scan",
            &format!("Scan {scan_id} of {target_url} started (mode: {mode})"),
        );

        let mut http = HttpClient::new(self.options.request_timeout_secs)
            .map_err(|e| ScannerError::Configuration(e.to_string()))?;
        if let Some(session) = &self.options.session {
            if !session.is_empty() {
                http = http.with_session(session);
                self.notify(ProgressLevel::Info, "scan", "Session credentials attached");
            }
        }
        let http = Arc::new(http);
        let gate = Arc::new(RequestGate::new(self.options.rate_limit_ms));

        // An invalid auth config drops the authenticated checks only
        let auth = match auth {
            Some(config) => match config.validate() {
                Ok(()) => Some(config),
                Err(e) => {
                    self.notify(
                        ProgressLevel::Warning,
                        "auth",
                        &format!("Auth config rejected, authenticated checks skipped: {e}"),
                    );
                    None
                }
            },
            None => None,
        };

        self.notify(ProgressLevel::Info, "crawl", "Crawling target");
        let crawler = WebCrawler::new(
            http.clone(),
            gate.clone(),
            self.options.clone(),
            self.cancel.clone(),
        );
        let crawl = crawler.crawl(target_url).await?;
        let root_url = crate::crawler::normalize_url(target_url)
            .ok_or_else(|| ScannerError::MalformedInput(format!("invalid root URL: {target_url}")))?;
        self.notify(
            ProgressLevel::Success,
            "crawl",
            &format!(
                "{} pages, {} endpoints, {} forms",
                crawl.site_map.urls.len(),
                crawl.site_map.endpoints.len(),
                crawl.site_map.forms.len()
            ),
        );

        let mut findings: Vec<Finding> = Vec::new();

        if mode.runs_static() {
            self.notify(ProgressLevel::Info, "static", "Running static analyzers");
            let static_findings = self.run_static(&crawl);
            self.notify(
                ProgressLevel::Success,
                "static",
                &format!("{} findings", static_findings.len()),
            );
            findings.extend(static_findings);
        }

        if mode.runs_dynamic() {
            let target = TesterTarget::from_crawl(
                root_url.clone(),
                &crawl,
                auth,
                http.clone(),
                gate.clone(),
                self.cancel.clone(),
            );
            info!(
                "[Engine] Dynamic surface: {} endpoints, {} forms",
                target.endpoints.len(),
                target.forms.len()
            );

            for tester in DynamicTester::ALL {
                if self.cancel.load(Ordering::Relaxed) {
                    warn!("[Engine] Cancellation requested, stopping dynamic phase");
                    self.notify(ProgressLevel::Warning, "scan", "Cancelled, returning partial results");
                    break;
                }
                self.notify(ProgressLevel::Info, tester.name(), "Running tester");
                let tester_findings = tester.run(&target).await;
                self.notify(
                    ProgressLevel::Success,
                    tester.name(),
                    &format!("{} findings", tester_findings.len()),
                );
                findings.extend(tester_findings);
            }
        }

        self.notify(ProgressLevel::Info, "headers", "Evaluating response headers and CSP");
        let tests = self.header_tests(&crawl, &root_url, &http, &gate, mode).await;
        let scoring = scoring::score(&tests);
        self.notify(
            ProgressLevel::Success,
            "scoring",
            &format!("Score {} ({})", scoring.score, scoring.risk_level),
        );

        let completed = chrono::Utc::now();
        let duration_seconds = (completed - started).num_milliseconds() as f64 / 1000.0;
        self.notify(
            ProgressLevel::Success,
            "scan",
            &format!(
                "Scan {scan_id} finished in {duration_seconds:.1}s with {} findings",
                findings.len()
            ),
        );

        Ok(ScanResults {
            scan_id,
            target: root_url,
            mode,
            findings,
            tests,
            scoring,
            site_map_summary: crawl.site_map.summary(),
            started_at: started.to_rfc3339(),
            completed_at: completed.to_rfc3339(),
            duration_seconds,
        })
    }

    fn run_static(&self, crawl: &CrawlOutput) -> Vec<Finding> {
        let markup = MarkupAnalyzer::new();
        let script = ScriptAnalyzer::new();
        let mut findings = Vec::new();

        let inline_selector = Selector::parse("script:not([src])").unwrap();
        for page in &crawl.pages {
            let ctx = ResponseContext::from_headers(&page.headers);
            findings.extend(markup.analyze(&page.html, &page.url, Some(&ctx)));

            // Inline scripts inherit the hosting page's response headers
            let document = Html::parse_document(&page.html);
            for element in document.select(&inline_selector) {
                let source: String = element.text().collect();
                if !source.trim().is_empty() {
                    findings.extend(script.analyze(&source, &page.url, Some(&ctx)));
                }
            }
        }

        for fetched in &crawl.scripts {
            findings.extend(script.analyze(&fetched.source, &fetched.url, None));
        }

        if let Some(manifest) = &self.dependency_manifest {
            let deps = DependencyAnalyzer::new();
            findings.extend(deps.analyze(manifest, "package.json", None));
        }

        findings
    }

    /// Header and CSP tests run against the root response the crawl
    /// already holds; a live re-fetch happens only in dynamic mode when
    /// the crawl kept no copy of it
    async fn header_tests(
        &self,
        crawl: &CrawlOutput,
        root_url: &str,
        http: &Arc<HttpClient>,
        gate: &Arc<RequestGate>,
        mode: ScanMode,
    ) -> Vec<SecurityTest> {
        let root_page = crawl
            .pages
            .iter()
            .find(|p| p.url == root_url)
            .or_else(|| crawl.pages.first());

        let (headers, body, url) = match root_page {
            Some(page) => (page.headers.clone(), page.html.clone(), page.url.clone()),
            None if mode.runs_dynamic() => {
                gate.wait_for_slot(root_url).await;
                match http.get(root_url).await {
                    Ok(resp) => (resp.headers, resp.body, root_url.to_string()),
                    Err(e) => {
                        warn!("[Engine] Could not fetch {} for header analysis: {}", root_url, e);
                        return Vec::new();
                    }
                }
            }
            None => {
                warn!("[Engine] No crawled root response; header analysis skipped in static mode");
                return Vec::new();
            }
        };

        let mut tests = analyze_headers(&headers, &body, &url);
        tests.extend(evaluate_csp(&headers));
        tests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_names() {
        assert_eq!(
            param_names("https://example.com/s?a=1&b=2"),
            vec!["a", "b"]
        );
        assert!(param_names("https://example.com/s").is_empty());
    }

    #[test]
    fn test_inject_param_replaces_only_target() {
        let url = inject_param("https://example.com/s?a=1&b=2", "b", "' OR '1'='1").unwrap();
        assert!(url.contains("a=1"));
        assert!(!url.contains("b=2"));
        assert!(url.contains("b=%27+OR+%271%27%3D%271"));
    }

    #[test]
    fn test_with_query_builds_get_submission() {
        let url = with_query(
            "https://example.com/search",
            &[("q".to_string(), "term".to_string())],
        )
        .unwrap();
        assert_eq!(url, "https://example.com/search?q=term");
    }

    #[test]
    fn test_tester_order_is_fixed() {
        let names: Vec<&str> = DynamicTester::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec!["xss", "sqli", "path-traversal", "csrf", "auth-bypass"]
        );
    }

    #[test]
    fn test_surface_caps() {
        use crate::crawler::SiteMap;

        let mut site_map = SiteMap::new();
        for i in 0..30 {
            site_map
                .endpoints
                .insert(format!("https://example.com/e{i}?id={i}"));
        }
        for i in 0..9 {
            site_map.forms.push(DiscoveredForm {
                page_url: format!("https://example.com/p{i}"),
                action: format!("/submit{i}"),
                method: "POST".into(),
                fields: vec!["a".into()],
            });
        }
        let crawl = CrawlOutput {
            site_map,
            ..Default::default()
        };

        let target = TesterTarget::from_crawl(
            "https://example.com".into(),
            &crawl,
            None,
            Arc::new(HttpClient::new(5).unwrap()),
            Arc::new(RequestGate::new(100)),
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(target.endpoints.len(), MAX_TESTED_ENDPOINTS);
        assert_eq!(target.forms.len(), MAX_TESTED_FORMS);

        // Deterministic subset: sorted order, lowest URLs kept
        let mut sorted = target.endpoints.clone();
        sorted.sort();
        assert_eq!(target.endpoints, sorted);
    }
}
