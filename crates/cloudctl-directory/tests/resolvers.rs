use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cloudctl_directory::{
    DirectoryError, HttpDirectory, HttpDirectoryConfig, Principal, PrincipalResolver,
    StaticDirectory, resolve_all,
};

fn set(items: &[&str]) -> BTreeSet<Principal> {
    items.iter().map(|s| Principal::new(s)).collect()
}

#[tokio::test]
async fn test_static_directory_resolves_and_updates() {
    let directory = StaticDirectory::from_groups(HashMap::from([(
        "payments-devs",
        vec!["A@example.com", "b@example.com"],
    )]));

    assert_eq!(
        directory.resolve("payments-devs").await.unwrap(),
        set(&["a@example.com", "b@example.com"])
    );

    directory.set_group("payments-devs", ["b@example.com"]);
    assert_eq!(
        directory.resolve("payments-devs").await.unwrap(),
        set(&["b@example.com"])
    );
}

#[tokio::test]
async fn test_static_directory_edge_cases() {
    let directory = StaticDirectory::new();
    assert!(directory.resolve("").await.unwrap().is_empty());
    assert!(matches!(
        directory.resolve("ghosts").await,
        Err(DirectoryError::UnknownGroup(_))
    ));
}

#[tokio::test]
async fn test_resolve_all_unions_groups() {
    let directory = StaticDirectory::new()
        .with_group("devs", ["a@example.com", "b@example.com"])
        .with_group("leads", ["b@example.com", "c@example.com"]);

    let all = resolve_all(&directory, ["devs", "leads"]).await.unwrap();
    assert_eq!(all, set(&["a@example.com", "b@example.com", "c@example.com"]));

    assert!(resolve_all(&directory, ["devs", "missing"]).await.is_err());
}

async fn http_directory(server: &MockServer) -> HttpDirectory {
    let config = HttpDirectoryConfig::new(Url::parse(&server.uri()).unwrap())
        .with_timeout(Duration::from_secs(2));
    HttpDirectory::new(config).unwrap()
}

#[tokio::test]
async fn test_http_directory_resolves_members() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups/payments-devs/members"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": ["Alice@Example.com", "bob@example.com", "alice@example.com"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let directory = http_directory(&server).await;
    let members = directory.resolve("payments-devs").await.unwrap();
    assert_eq!(members, set(&["alice@example.com", "bob@example.com"]));
}

#[tokio::test]
async fn test_http_directory_maps_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups/ghosts/members"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groups/flaky/members"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groups/garbled/members"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let directory = http_directory(&server).await;
    assert!(matches!(
        directory.resolve("ghosts").await,
        Err(DirectoryError::UnknownGroup(_))
    ));
    let err = directory.resolve("flaky").await.unwrap_err();
    assert!(matches!(err, DirectoryError::Unavailable(_)));
    assert!(err.is_retryable());
    assert!(matches!(
        directory.resolve("garbled").await,
        Err(DirectoryError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_http_directory_unreachable() {
    let config = HttpDirectoryConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
        .with_timeout(Duration::from_millis(500));
    let directory = HttpDirectory::new(config).unwrap();
    assert!(matches!(
        directory.resolve("devs").await,
        Err(DirectoryError::Unavailable(_))
    ));
}
