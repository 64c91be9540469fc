// tests/fetcher_http.rs
//
// HttpFetcher against a wiremock upstream: body passthrough and the
// mapping of transport failures onto the FetchError taxonomy.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devdash_aggregator::error::FetchError;
use devdash_aggregator::fetch::{Fetch, HttpFetcher};

fn fetcher(timeout_ms: u64) -> HttpFetcher {
    HttpFetcher::new(Duration::from_millis(timeout_ms)).expect("build fetcher")
}

#[tokio::test]
async fn fetch_returns_the_body_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss></rss>"))
        .mount(&server)
        .await;

    let body = fetcher(2_000)
        .fetch(&format!("{}/feed", server.uri()))
        .await
        .expect("fetch should succeed");
    assert_eq!(body, "<rss></rss>");
}

#[tokio::test]
async fn non_2xx_status_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = fetcher(2_000)
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(404)));
}

#[tokio::test]
async fn slow_upstream_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = fetcher(200)
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
}

#[tokio::test]
async fn unreachable_host_maps_to_connection_error() {
    // Nothing listens on this port.
    let err = fetcher(2_000)
        .fetch("http://127.0.0.1:1/")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Connection(_)));
}
