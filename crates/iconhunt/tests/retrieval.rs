//! Integration tests for single-asset downloads and the primary source.
//!
//! Every test runs against a local wiremock server with `InstantDelay`,
//! so jitter and backoff are recorded instead of slept.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iconhunt::delay::DelayProvider;
use iconhunt::http::HttpClient;
use iconhunt::{
    AssetDownloader, CancellationToken, IconConfig, IconError, InstantDelay, PrimarySourceFetcher,
};

// ─────────────────────── helpers ───────────────────────

const STAR_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><circle cx="12" cy="12" r="10" fill="blue"/></svg>"#;
const HEART_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><rect x="2" y="2" width="20" height="20" fill="red"/></svg>"#;

struct Harness {
    server: MockServer,
    delay: Arc<InstantDelay>,
    downloader: AssetDownloader,
    primary: PrimarySourceFetcher,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let config = IconConfig::with_origin(&server.uri());
    let delay = Arc::new(InstantDelay::new());
    let provider: Arc<dyn DelayProvider> = delay.clone();
    let http = HttpClient::new(&config);
    let downloader = AssetDownloader::new(http.clone(), provider.clone(), &config);
    let primary =
        PrimarySourceFetcher::new(http, downloader.clone(), provider, &config).unwrap();
    Harness {
        server,
        delay,
        downloader,
        primary,
    }
}

/// Listing page whose images point at `ids` on the mock origin.
fn listing(origin: &str, ids: &[(u32, &str)]) -> String {
    let imgs: String = ids
        .iter()
        .map(|(n, slug)| format!("    <img src=\"{origin}/show/{n}/{slug}.svg\" alt=\"{slug}\">\n"))
        .collect();
    format!("<!DOCTYPE html>\n<html><body>\n<div class=\"results\">\n{imgs}</div>\n</body></html>")
}

async fn serve_page(server: &MockServer, query: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/vectors/{query}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn serve_asset(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

// ─────────────────────── downloader ───────────────────────

#[tokio::test]
async fn test_download_trims_body() {
    let h = harness().await;
    serve_asset(&h.server, "/show/1/star.svg", 200, &format!("\n  {STAR_SVG}\n\n")).await;

    let url = format!("{}/show/1/star.svg", h.server.uri());
    let svg = h
        .downloader
        .download(&url, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(svg, STAR_SVG);
    assert_eq!(h.delay.recorded(), vec![Duration::from_millis(200)]);
}

#[tokio::test]
async fn test_download_returns_404_body_without_error() {
    let h = harness().await;
    serve_asset(&h.server, "/missing.svg", 404, "Not Found").await;

    let url = format!("{}/missing.svg", h.server.uri());
    let body = h
        .downloader
        .download(&url, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn test_download_refused_connection_is_transport_error() {
    let h = harness().await;
    let err = h
        .downloader
        .download("http://127.0.0.1:1/star.svg", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[tokio::test]
async fn test_download_sends_asset_headers() {
    let h = harness().await;
    let referer = format!("{}/", h.server.uri());
    Mock::given(method("GET"))
        .and(path("/show/2/heart.svg"))
        .and(header("Referer", referer.as_str()))
        .and(header("Sec-Fetch-Dest", "image"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HEART_SVG))
        .expect(1)
        .mount(&h.server)
        .await;

    let url = format!("{}/show/2/heart.svg", h.server.uri());
    let svg = h
        .downloader
        .download(&url, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(svg, HEART_SVG);
}

// ─────────────────────── primary source ───────────────────────

#[tokio::test]
async fn test_primary_extracts_limit_in_document_order() {
    let h = harness().await;
    let origin = h.server.uri();
    serve_page(
        &h.server,
        "star",
        listing(&origin, &[(3, "c"), (1, "a"), (2, "b")]),
    )
    .await;
    serve_asset(&h.server, "/show/3/c.svg", 200, STAR_SVG).await;
    serve_asset(&h.server, "/show/1/a.svg", 200, HEART_SVG).await;
    serve_asset(&h.server, "/show/2/b.svg", 200, STAR_SVG).await;

    let assets = h
        .primary
        .fetch("star", 2, &CancellationToken::new())
        .await
        .unwrap();
    let urls: Vec<_> = assets.iter().map(|a| a.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{origin}/show/3/c.svg"),
            format!("{origin}/show/1/a.svg"),
        ]
    );
    assert_eq!(assets[1].svg, HEART_SVG);
}

#[tokio::test]
async fn test_primary_skips_failed_and_non_svg_assets() {
    let h = harness().await;
    let origin = h.server.uri();
    serve_page(
        &h.server,
        "star",
        listing(&origin, &[(1, "gone"), (2, "ok"), (3, "html")]),
    )
    .await;
    serve_asset(&h.server, "/show/1/gone.svg", 404, "Not Found").await;
    serve_asset(&h.server, "/show/2/ok.svg", 200, STAR_SVG).await;
    serve_asset(&h.server, "/show/3/html.svg", 200, "<html>blocked</html>").await;

    let assets = h
        .primary
        .fetch("star", 3, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].url, format!("{origin}/show/2/ok.svg"));
}

#[tokio::test]
async fn test_primary_retries_with_exponential_backoff() {
    let h = harness().await;
    let origin = h.server.uri();
    Mock::given(method("GET"))
        .and(path("/vectors/star/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&h.server)
        .await;
    serve_page(&h.server, "star", listing(&origin, &[(1, "star")])).await;
    serve_asset(&h.server, "/show/1/star.svg", 200, STAR_SVG).await;

    let assets = h
        .primary
        .fetch("star", 3, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(
        h.delay.recorded(),
        vec![
            Duration::from_millis(500),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_millis(200),
        ]
    );
}

#[tokio::test]
async fn test_primary_stops_on_first_success() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/vectors/star/"))
        .and(header("Sec-Fetch-Mode", "navigate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h
        .primary
        .fetch("star", 3, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, IconError::NoMatches(ref q) if q == "star"), "{err}");
    assert_eq!(h.delay.recorded(), vec![Duration::from_millis(500)]);
}

#[tokio::test]
async fn test_primary_exhausts_attempts() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/vectors/star/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&h.server)
        .await;

    let err = h
        .primary
        .fetch("star", 3, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        IconError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, IconError::Status(403)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_primary_all_downloads_failing_is_an_error() {
    let h = harness().await;
    let origin = h.server.uri();
    serve_page(&h.server, "star", listing(&origin, &[(1, "a"), (2, "b")])).await;
    serve_asset(&h.server, "/show/1/a.svg", 500, "oops").await;
    serve_asset(&h.server, "/show/2/b.svg", 404, "Not Found").await;

    let err = h
        .primary
        .fetch("star", 3, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, IconError::NoUsableAssets { candidates: 2, .. }),
        "{err}"
    );
}

#[tokio::test]
async fn test_primary_cancel_aborts_in_flight_request() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/vectors/star/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&h.server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = h.primary.fetch("star", 3, &cancel).await.unwrap_err();
    assert!(matches!(err, IconError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
}
