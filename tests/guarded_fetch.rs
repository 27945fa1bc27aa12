//! End-to-end redirect behavior of the guarded fetcher against a local mock
//! server. DNS is stubbed to a public address so classification passes, and
//! the HTTP client pins the test hostname to the wiremock listener.

use async_trait::async_trait;
use fetchguard::{
    AddressClassification, DenyReason, FetchError, FetchOptions, GuardedFetcher, Resolver,
};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPSTREAM_HOST: &str = "upstream.test";

/// Answers every lookup with a single public address.
struct PublicResolver;

#[async_trait]
impl Resolver for PublicResolver {
    async fn resolve(&self, _host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))])
    }
}

/// Answers every lookup with an RFC 1918 address.
struct InternalResolver;

#[async_trait]
impl Resolver for InternalResolver {
    async fn resolve(&self, _host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        Ok(vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))])
    }
}

fn fetcher_for(server: &MockServer, resolver: Arc<dyn Resolver>) -> GuardedFetcher {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .resolve(UPSTREAM_HOST, *server.address())
        .build()
        .unwrap();
    GuardedFetcher::builder(FetchOptions::default())
        .resolver(resolver)
        .http_client(client)
        .build()
        .unwrap()
}

fn upstream_url(server: &MockServer, route: &str) -> String {
    format!("http://{UPSTREAM_HOST}:{}{route}", server.address().port())
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
        .mount(server)
        .await;
}

#[tokio::test]
async fn plain_fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello article"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let body = fetcher
        .fetch_text(&upstream_url(&server, "/article"))
        .await
        .unwrap();
    assert_eq!(body, "hello article");
}

#[tokio::test]
async fn five_redirects_then_ok_succeeds() {
    let server = MockServer::start().await;
    for hop in 0..5 {
        mount_redirect(&server, &format!("/hop/{hop}"), &format!("/hop/{}", hop + 1)).await;
    }
    Mock::given(method("GET"))
        .and(path("/hop/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("made it"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let response = fetcher.fetch(&upstream_url(&server, "/hop/0")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "made it");
}

#[tokio::test]
async fn six_redirects_exceed_the_bound() {
    let server = MockServer::start().await;
    for hop in 0..6 {
        mount_redirect(&server, &format!("/loop/{hop}"), &format!("/loop/{}", hop + 1)).await;
    }

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let err = fetcher
        .fetch(&upstream_url(&server, "/loop/0"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::TooManyRedirects { max: 5 }));
}

#[tokio::test]
async fn redirect_to_metadata_address_is_denied_on_second_hop() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/pivot", "http://169.254.169.254/latest/meta-data/").await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let err = fetcher
        .fetch(&upstream_url(&server, "/pivot"))
        .await
        .unwrap_err();
    match err {
        FetchError::Denied { url, reason } => {
            assert!(url.starts_with("http://169.254.169.254/"));
            assert_eq!(
                reason,
                DenyReason::PrivateAddress {
                    address: "169.254.169.254".parse().unwrap(),
                    classification: AddressClassification::LinkLocal,
                }
            );
        }
        other => panic!("expected Denied, got {other:?}"),
    }
}

#[tokio::test]
async fn relative_redirect_resolves_against_current_url() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/posts/old", "../articles/new").await;
    Mock::given(method("GET"))
        .and(path("/articles/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let response = fetcher
        .fetch(&upstream_url(&server, "/posts/old"))
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/articles/new");
    assert_eq!(response.text().await.unwrap(), "moved");
}

#[tokio::test]
async fn redirect_without_location_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/noloc"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let err = fetcher
        .fetch(&upstream_url(&server, "/noloc"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::RedirectMissingLocation { .. }));
}

#[tokio::test]
async fn unparsable_redirect_target_is_an_error() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/badloc", "http://[notanaddr/").await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let err = fetcher
        .fetch(&upstream_url(&server, "/badloc"))
        .await
        .unwrap_err();
    match err {
        FetchError::InvalidRedirectTarget { location } => {
            assert_eq!(location, "http://[notanaddr/");
        }
        other => panic!("expected InvalidRedirectTarget, got {other:?}"),
    }
}

#[tokio::test]
async fn non_utf8_location_is_invalid_target_not_missing() {
    // The header is present; only its value is garbage. That must not be
    // conflated with a redirect that lacks Location entirely.
    let server = MockServer::start().await;
    let raw = wiremock::http::HeaderValue::from_bytes(b"http://\xff\xfe/").unwrap();
    Mock::given(method("GET"))
        .and(path("/nonutf8"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", raw))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let err = fetcher
        .fetch(&upstream_url(&server, "/nonutf8"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidRedirectTarget { .. }));
}

#[tokio::test]
async fn non_redirect_statuses_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let response = fetcher
        .fetch(&upstream_url(&server, "/missing"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn fetch_text_rejects_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));
    let err = fetcher
        .fetch_text(&upstream_url(&server, "/gone"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::HttpStatus { status: 410, .. }));
}

#[tokio::test]
async fn internal_host_is_denied_before_any_request() {
    let server = MockServer::start().await;
    let fetcher = fetcher_for(&server, Arc::new(InternalResolver));

    let err = fetcher
        .fetch(&upstream_url(&server, "/article"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::Denied {
            reason: DenyReason::PrivateAddress { .. },
            ..
        }
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn localhost_target_is_denied() {
    let server = MockServer::start().await;
    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));

    let err = fetcher.fetch("http://localhost:3000/admin").await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Denied {
            reason: DenyReason::LocalhostDenied,
            ..
        }
    ));
}

#[tokio::test]
async fn unparsable_input_is_denied() {
    let server = MockServer::start().await;
    let fetcher = fetcher_for(&server, Arc::new(PublicResolver));

    let err = fetcher.fetch("not a url").await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Denied {
            reason: DenyReason::InvalidUrl,
            ..
        }
    ));
}
