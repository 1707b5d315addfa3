// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Web Crawler
 * Breadth-first discovery of the target's reachable surface:
 * pages, parameterized endpoints and forms
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::config::CrawlerOptions;
use crate::errors::ScannerError;
use crate::http_client::HttpClient;
use crate::rate_limiter::RequestGate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Discovered form on a crawled page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredForm {
    pub page_url: String,
    pub action: String,
    pub method: String,
    pub fields: Vec<String>,
}

impl DiscoveredForm {
    /// Hash signature for deduplication; field order does not matter
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.action.hash(&mut hasher);
        self.method.hash(&mut hasher);

        let mut names = self.fields.clone();
        names.sort();
        for name in names {
            name.hash(&mut hasher);
        }

        hasher.finish()
    }

    pub fn is_state_changing(&self) -> bool {
        !self.method.eq_ignore_ascii_case("GET")
    }
}

/// The crawler's discovered graph of URLs, endpoints and forms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteMap {
    /// Visited URLs, normalized and deduplicated
    pub urls: HashSet<String>,
    /// URLs carrying query parameters, treated as injectable surfaces
    pub endpoints: HashSet<String>,
    pub forms: Vec<DiscoveredForm>,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> crate::types::SiteMapSummary {
        crate::types::SiteMapSummary {
            pages_crawled: self.urls.len(),
            endpoints: self.endpoints.len(),
            forms: self.forms.len(),
        }
    }

    pub fn deduplicate_forms(&mut self) {
        let mut seen = HashSet::new();
        let before = self.forms.len();
        self.forms.retain(|form| seen.insert(form.signature()));

        let removed = before - self.forms.len();
        if removed > 0 {
            info!("[Crawler] Deduplicated {} duplicate forms", removed);
        }
    }
}

/// A fetched page kept for the static analysis phase
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    pub headers: HashMap<String, String>,
}

/// A fetched external script kept for the static analysis phase
#[derive(Debug, Clone)]
pub struct FetchedScript {
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    pub site_map: SiteMap,
    pub pages: Vec<FetchedPage>,
    pub scripts: Vec<FetchedScript>,
}

/// Normalize a URL for frontier deduplication: strip the fragment, sort
/// query keys, remove the trailing slash. Idempotent: normalizing an
/// already-normalized URL is a no-op.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    let mut out = url.to_string();
    if url.query().is_none() && out.ends_with('/') {
        out.pop();
    }
    Some(out)
}

/// robots.txt rules for the target host
#[derive(Debug, Clone, Default)]
struct RobotsRules {
    disallowed: Vec<String>,
    crawl_delay: Option<Duration>,
}

impl RobotsRules {
    fn is_allowed(&self, path: &str) -> bool {
        !self.disallowed.iter().any(|rule| path.starts_with(rule))
    }
}

fn parse_robots_txt(body: &str) -> RobotsRules {
    let mut rules = RobotsRules::default();
    let mut in_section = false;

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let lower = trimmed.to_lowercase();

        if let Some(agent) = lower.strip_prefix("user-agent:") {
            in_section = agent.trim() == "*";
            continue;
        }

        if !in_section {
            continue;
        }

        if lower.starts_with("disallow:") {
            let path = trimmed[9..].trim();
            if !path.is_empty() {
                rules.disallowed.push(path.to_string());
            }
        } else if lower.starts_with("crawl-delay:") {
            if let Ok(secs) = trimmed[12..].trim().parse::<f64>() {
                rules.crawl_delay = Some(Duration::from_millis((secs * 1000.0) as u64));
            }
        }
    }

    rules
}

static JS_ROUTE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"location\.href\s*=\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"router\.push\(\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"\bhref:\s*["']([^"']+)["']"#).unwrap(),
    ]
});

static SITEMAP_LOC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").unwrap());

/// Maximum external scripts fetched per crawl
const MAX_SCRIPTS: usize = 20;

pub struct WebCrawler {
    http: Arc<HttpClient>,
    gate: Arc<RequestGate>,
    options: CrawlerOptions,
    cancel: Arc<AtomicBool>,
}

impl WebCrawler {
    pub fn new(
        http: Arc<HttpClient>,
        gate: Arc<RequestGate>,
        options: CrawlerOptions,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            http,
            gate,
            options,
            cancel,
        }
    }

    /// Crawl from the root URL. FIFO frontier, breadth-first; every
    /// candidate is normalized before the dedupe check; per-URL failures
    /// are logged and dropped without failing the crawl.
    pub async fn crawl(&self, root_url: &str) -> Result<CrawlOutput, ScannerError> {
        let root = normalize_url(root_url)
            .ok_or_else(|| ScannerError::MalformedInput(format!("invalid root URL: {root_url}")))?;
        let base = Url::parse(&root)
            .map_err(|e| ScannerError::MalformedInput(format!("invalid root URL: {e}")))?;
        let base_host = base
            .host_str()
            .ok_or_else(|| ScannerError::MalformedInput("root URL has no host".into()))?
            .to_string();

        info!("[Crawler] Starting crawl of {}", root);

        let mut output = CrawlOutput::default();
        let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut script_urls_seen: HashSet<String> = HashSet::new();

        frontier.push_back((root.clone(), 0));
        queued.insert(root.clone());

        // robots.txt fetched once; fetch failure means no restrictions
        let robots = if self.options.respect_robots {
            self.fetch_robots(&base).await
        } else {
            RobotsRules::default()
        };

        // sitemap.xml parsed once at the site root and merged into the frontier
        for url in self.discover_sitemap(&base).await {
            if let Some(normalized) = normalize_url(&url) {
                if self.in_scope(&normalized, &base_host) && queued.insert(normalized.clone()) {
                    frontier.push_back((normalized, 0));
                }
            }
        }

        while let Some((url, depth)) = frontier.pop_front() {
            if self.cancel.load(Ordering::Relaxed) {
                warn!("[Crawler] Cancellation requested, stopping crawl");
                break;
            }

            if visited.len() >= self.options.max_pages {
                warn!(
                    "[Crawler] Reached max pages limit ({})",
                    self.options.max_pages
                );
                break;
            }

            if depth > self.options.max_depth || visited.contains(&url) {
                continue;
            }

            if self.options.respect_robots && !self.options.robots_override_consent {
                if let Ok(parsed) = Url::parse(&url) {
                    if !robots.is_allowed(parsed.path()) {
                        warn!(
                            "[Crawler] Skipping {} ({})",
                            url,
                            ScannerError::PolicyViolation {
                                path: parsed.path().to_string()
                            }
                        );
                        continue;
                    }
                }
            }

            self.gate.wait_for_slot(&url).await;
            if let Some(delay) = robots.crawl_delay {
                if delay > self.gate.period() {
                    tokio::time::sleep(delay - self.gate.period()).await;
                }
            }

            let response = match self.http.get(&url).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("[Crawler] Failed to fetch {}: {}", url, e);
                    continue;
                }
            };

            visited.insert(url.clone());
            output.site_map.urls.insert(url.clone());
            if url.contains('?') {
                output.site_map.endpoints.insert(url.clone());
            }

            debug!("[Crawler] Crawled {} (depth {})", url, depth);

            if !response.is_html() {
                continue;
            }

            // Parse and extract synchronously so the document never crosses
            // an await point
            let (forms, candidates, scripts) = {
                let document = Html::parse_document(&response.body);
                let forms = extract_forms(&document, &url);
                let mut candidates = extract_candidates(&document, &url);
                candidates.extend(extract_js_routes(&document, &url));
                let scripts = extract_script_urls(&document, &url);
                (forms, candidates, scripts)
            };

            output.site_map.forms.extend(forms);
            output.pages.push(FetchedPage {
                url: url.clone(),
                html: response.body,
                headers: response.headers,
            });

            for candidate in candidates {
                let Some(normalized) = normalize_url(&candidate) else {
                    continue;
                };
                if !self.in_scope(&normalized, &base_host) {
                    continue;
                }
                // Parameterized links are injectable surfaces even when the
                // page itself falls beyond the depth cutoff
                if normalized.contains('?') {
                    output.site_map.endpoints.insert(normalized.clone());
                }
                if queued.insert(normalized.clone()) {
                    frontier.push_back((normalized, depth + 1));
                }
            }

            for script_url in scripts {
                if output.scripts.len() >= MAX_SCRIPTS {
                    break;
                }
                let Some(normalized) = normalize_url(&script_url) else {
                    continue;
                };
                if !self.in_scope(&normalized, &base_host)
                    || !script_urls_seen.insert(normalized.clone())
                {
                    continue;
                }

                self.gate.wait_for_slot(&normalized).await;
                match self.http.get(&normalized).await {
                    Ok(resp) => output.scripts.push(FetchedScript {
                        url: normalized,
                        source: resp.body,
                    }),
                    Err(e) => debug!("[Crawler] Failed to fetch script {}: {}", normalized, e),
                }
            }
        }

        output.site_map.deduplicate_forms();

        info!(
            "[SUCCESS] [Crawler] Crawl complete: {} pages, {} endpoints, {} forms, {} scripts",
            output.site_map.urls.len(),
            output.site_map.endpoints.len(),
            output.site_map.forms.len(),
            output.scripts.len()
        );

        Ok(output)
    }

    fn in_scope(&self, url: &str, base_host: &str) -> bool {
        if self.options.allow_external {
            return true;
        }
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == base_host))
            .unwrap_or(false)
    }

    async fn fetch_robots(&self, base: &Url) -> RobotsRules {
        let mut robots = base.clone();
        robots.set_path("/robots.txt");
        robots.set_query(None);
        let robots_url = robots.to_string();

        self.gate.wait_for_slot(&robots_url).await;
        match self.http.get(&robots_url).await {
            Ok(resp) if resp.status_code == 200 => {
                let rules = parse_robots_txt(&resp.body);
                if !rules.disallowed.is_empty() {
                    info!(
                        "[Crawler] robots.txt: {} disallowed paths",
                        rules.disallowed.len()
                    );
                }
                rules
            }
            // No robots.txt or fetch failure = no restrictions
            _ => RobotsRules::default(),
        }
    }

    async fn discover_sitemap(&self, base: &Url) -> Vec<String> {
        let mut sitemap = base.clone();
        sitemap.set_path("/sitemap.xml");
        sitemap.set_query(None);
        let sitemap_url = sitemap.to_string();

        self.gate.wait_for_slot(&sitemap_url).await;
        let mut urls = Vec::new();
        if let Ok(resp) = self.http.get(&sitemap_url).await {
            if resp.status_code == 200 {
                for cap in SITEMAP_LOC.captures_iter(&resp.body) {
                    urls.push(cap[1].to_string());
                }
            }
        }

        if !urls.is_empty() {
            info!("[Crawler] Discovered {} URLs from sitemap.xml", urls.len());
        }
        urls
    }
}

fn resolve(base: &str, relative: &str) -> Option<String> {
    if relative.starts_with('#') || relative.starts_with("javascript:") {
        return None;
    }
    Url::parse(base).ok()?.join(relative).ok().map(|u| u.to_string())
}

fn extract_forms(document: &Html, page_url: &str) -> Vec<DiscoveredForm> {
    let form_selector = Selector::parse("form").unwrap();
    let input_selector = Selector::parse("input, textarea, select").unwrap();

    let mut forms = Vec::new();
    for form in document.select(&form_selector) {
        let action = form.value().attr("action").unwrap_or("").to_string();
        let method = form
            .value()
            .attr("method")
            .unwrap_or("GET")
            .to_uppercase();

        let mut fields = Vec::new();
        for input in form.select(&input_selector) {
            if let Some(name) = input.value().attr("name").or_else(|| input.value().attr("id")) {
                if !name.is_empty() {
                    fields.push(name.to_string());
                }
            }
        }

        let absolute_action = if action.is_empty() {
            String::new()
        } else {
            resolve(page_url, &action).unwrap_or(action)
        };

        debug!(
            "[Crawler] Found form: '{}' with {} fields",
            absolute_action,
            fields.len()
        );

        forms.push(DiscoveredForm {
            page_url: page_url.to_string(),
            action: absolute_action,
            method,
            fields,
        });
    }

    forms
}

/// Candidate links from anchors, stylesheet/prefetch links, images,
/// iframes and form actions
fn extract_candidates(document: &Html, page_url: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    let href_selector = Selector::parse("a[href], link[href]").unwrap();
    for element in document.select(&href_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(resolved) = resolve(page_url, href) {
                candidates.push(resolved);
            }
        }
    }

    let src_selector = Selector::parse("img[src], iframe[src]").unwrap();
    for element in document.select(&src_selector) {
        if let Some(src) = element.value().attr("src") {
            if let Some(resolved) = resolve(page_url, src) {
                candidates.push(resolved);
            }
        }
    }

    let form_selector = Selector::parse("form[action]").unwrap();
    for element in document.select(&form_selector) {
        if let Some(action) = element.value().attr("action") {
            if let Some(resolved) = resolve(page_url, action) {
                candidates.push(resolved);
            }
        }
    }

    candidates
}

/// Route literals inside inline scripts: location.href assignments,
/// router.push calls and object href: properties
fn extract_js_routes(document: &Html, page_url: &str) -> Vec<String> {
    let script_selector = Selector::parse("script:not([src])").unwrap();
    let mut routes = Vec::new();

    for script in document.select(&script_selector) {
        let source: String = script.text().collect();
        for pattern in JS_ROUTE_PATTERNS.iter() {
            for cap in pattern.captures_iter(&source) {
                if let Some(resolved) = resolve(page_url, &cap[1]) {
                    routes.push(resolved);
                }
            }
        }
    }

    routes
}

fn extract_script_urls(document: &Html, page_url: &str) -> Vec<String> {
    let script_selector = Selector::parse("script[src]").unwrap();
    document
        .select(&script_selector)
        .filter_map(|e| e.value().attr("src"))
        .filter_map(|src| resolve(page_url, src))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_fragment() {
        assert_eq!(
            normalize_url("https://example.com/page#section").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_normalize_sorts_query_keys() {
        assert_eq!(
            normalize_url("https://example.com/s?z=1&a=2").unwrap(),
            "https://example.com/s?a=2&z=1"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/a/b/").unwrap(),
            "https://example.com/a/b"
        );
        assert_eq!(
            normalize_url("https://example.com/").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://example.com/a/?z=9&a=1#frag",
            "https://example.com/",
            "https://example.com/p?b=2&a=1",
        ];
        for raw in inputs {
            let once = normalize_url(raw).unwrap();
            let twice = normalize_url(&once).unwrap();
            assert_eq!(once, twice, "normalization not idempotent for {raw}");
        }
    }

    #[test]
    fn test_normalize_rejects_non_http() {
        assert!(normalize_url("ftp://example.com/x").is_none());
        assert!(normalize_url("javascript:alert(1)").is_none());
        assert!(normalize_url("not a url").is_none());
    }

    #[test]
    fn test_form_signature_ignores_field_order() {
        let a = DiscoveredForm {
            page_url: "https://example.com/login".into(),
            action: "/submit".into(),
            method: "POST".into(),
            fields: vec!["email".into(), "password".into()],
        };
        let b = DiscoveredForm {
            fields: vec!["password".into(), "email".into()],
            ..a.clone()
        };
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_site_map_deduplicates_forms() {
        let form = DiscoveredForm {
            page_url: "https://example.com/p".into(),
            action: "/submit".into(),
            method: "POST".into(),
            fields: vec!["email".into()],
        };
        let mut map = SiteMap::new();
        map.forms.push(form.clone());
        map.forms.push(form.clone());
        map.forms.push(form);

        map.deduplicate_forms();
        assert_eq!(map.forms.len(), 1);
    }

    #[test]
    fn test_parse_robots_txt() {
        let body = "User-agent: *\nDisallow: /admin\nDisallow: /private\nCrawl-delay: 1.5\n\nUser-agent: googlebot\nDisallow: /\n";
        let rules = parse_robots_txt(body);
        assert_eq!(rules.disallowed, vec!["/admin", "/private"]);
        assert_eq!(rules.crawl_delay, Some(Duration::from_millis(1500)));
        assert!(!rules.is_allowed("/admin/users"));
        assert!(rules.is_allowed("/public"));
    }

    #[test]
    fn test_extract_js_routes() {
        let html = r#"<html><script>
            location.href = "/dashboard";
            router.push('/settings?tab=profile');
            const nav = [{ href: "/docs" }];
        </script></html>"#;
        let document = Html::parse_document(html);
        let routes = extract_js_routes(&document, "https://example.com/");
        assert!(routes.contains(&"https://example.com/dashboard".to_string()));
        assert!(routes
            .iter()
            .any(|r| r.contains("/settings?tab=profile")));
        assert!(routes.contains(&"https://example.com/docs".to_string()));
    }

    #[test]
    fn test_extract_forms() {
        let html = r#"<html><body>
            <form action="/search" method="get">
                <input name="q" />
            </form>
            <form action="https://example.com/login" method="POST">
                <input name="user" /><input type="password" name="pass" />
            </form>
        </body></html>"#;
        let document = Html::parse_document(html);
        let forms = extract_forms(&document, "https://example.com/");
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].method, "GET");
        assert!(!forms[0].is_state_changing());
        assert_eq!(forms[1].method, "POST");
        assert!(forms[1].is_state_changing());
        assert_eq!(forms[1].fields, vec!["user", "pass"]);
    }
}
