// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Crawler Integration Tests
 * Crawl behavior against a local mock server
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use verkko_scanner::config::CrawlerOptions;
use verkko_scanner::crawler::WebCrawler;
use verkko_scanner::http_client::HttpClient;
use verkko_scanner::rate_limiter::RequestGate;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    // set_body_raw keeps the mime type; set_body_string would reset
    // content-type to text/plain
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

fn crawler(options: CrawlerOptions) -> WebCrawler {
    WebCrawler::new(
        Arc::new(HttpClient::new(5).expect("client")),
        Arc::new(RequestGate::new(options.rate_limit_ms)),
        options,
        Arc::new(AtomicBool::new(false)),
    )
}

fn fast_options() -> CrawlerOptions {
    CrawlerOptions {
        rate_limit_ms: 100,
        respect_robots: false,
        ..CrawlerOptions::default()
    }
}

#[tokio::test]
async fn test_crawl_discovers_links_forms_and_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/about">About</a>
                <a href="/search?b=2&a=1">Search</a>
                <form action="/login" method="post">
                    <input name="user"><input type="password" name="pass">
                </form>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<html><p>about</p></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html("<html><p>results</p></html>"))
        .mount(&server)
        .await;

    let output = crawler(fast_options()).crawl(&server.uri()).await.unwrap();

    assert!(output.site_map.urls.contains(&format!("{}/about", server.uri())));
    // Endpoint recorded with sorted query keys
    assert!(output
        .site_map
        .endpoints
        .contains(&format!("{}/search?a=1&b=2", server.uri())));
    assert_eq!(output.site_map.forms.len(), 1);
    assert_eq!(output.site_map.forms[0].method, "POST");
    assert_eq!(output.site_map.forms[0].fields, vec!["user", "pass"]);
}

#[tokio::test]
async fn test_normalization_prevents_duplicate_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html>
                <a href="/page">1</a>
                <a href="/page#section">2</a>
                <a href="/page/">3</a>
            </html>"#,
        ))
        .mount(&server)
        .await;
    // All three variants collapse to one normalized URL
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<html>page</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let output = crawler(fast_options()).crawl(&server.uri()).await.unwrap();
    assert_eq!(output.site_map.urls.len(), 2);
}

#[tokio::test]
async fn test_max_pages_bounds_the_crawl() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{i}">p{i}</a>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!("<html>{links}</html>")))
        .mount(&server)
        .await;
    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/p{i}")))
            .respond_with(html("<html>leaf</html>"))
            .mount(&server)
            .await;
    }

    let options = CrawlerOptions {
        max_pages: 3,
        ..fast_options()
    };
    let output = crawler(options).crawl(&server.uri()).await.unwrap();
    assert_eq!(output.site_map.urls.len(), 3);
}

#[tokio::test]
async fn test_robots_disallow_skips_path_without_consent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><a href="/private/secret">s</a><a href="/public">p</a></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html("<html>ok</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("<html>secret</html>"))
        .expect(0)
        .mount(&server)
        .await;

    let options = CrawlerOptions {
        respect_robots: true,
        rate_limit_ms: 100,
        ..CrawlerOptions::default()
    };
    let output = crawler(options).crawl(&server.uri()).await.unwrap();

    assert!(output.site_map.urls.contains(&format!("{}/public", server.uri())));
    assert!(!output
        .site_map
        .urls
        .contains(&format!("{}/private/secret", server.uri())));
}

#[tokio::test]
async fn test_robots_fetch_failure_means_no_restrictions() {
    let server = MockServer::start().await;

    // No robots.txt mock: the fetch 404s
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<html><a href="/anything">a</a></html>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/anything"))
        .respond_with(html("<html>ok</html>"))
        .mount(&server)
        .await;

    let options = CrawlerOptions {
        respect_robots: true,
        rate_limit_ms: 100,
        ..CrawlerOptions::default()
    };
    let output = crawler(options).crawl(&server.uri()).await.unwrap();
    assert!(output
        .site_map
        .urls
        .contains(&format!("{}/anything", server.uri())));
}

#[tokio::test]
async fn test_sitemap_urls_merged_into_frontier() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<?xml version=\"1.0\"?><urlset><url><loc>{}/hidden</loc></url></urlset>",
            server.uri()
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html>no links here</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html("<html>found via sitemap</html>"))
        .mount(&server)
        .await;

    let output = crawler(fast_options()).crawl(&server.uri()).await.unwrap();
    assert!(output
        .site_map
        .urls
        .contains(&format!("{}/hidden", server.uri())));
}

#[tokio::test]
async fn test_external_hosts_skipped_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><a href="https://other.example.net/x">ext</a><a href="/local">l</a></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/local"))
        .respond_with(html("<html>ok</html>"))
        .mount(&server)
        .await;

    let output = crawler(fast_options()).crawl(&server.uri()).await.unwrap();
    assert!(!output
        .site_map
        .urls
        .iter()
        .any(|u| u.contains("other.example.net")));
}

#[tokio::test]
async fn test_same_origin_scripts_fetched_for_analysis() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<html><script src="/app.js"></script></html>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("const x = eval('1');", "application/javascript"),
        )
        .mount(&server)
        .await;

    let output = crawler(fast_options()).crawl(&server.uri()).await.unwrap();
    assert_eq!(output.scripts.len(), 1);
    assert!(output.scripts[0].source.contains("eval"));
}
