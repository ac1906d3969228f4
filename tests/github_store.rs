use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use storefront_orders::{
    config::GitHubSettings,
    store::{FileStore, GitHubStore, StoreError},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

const FILE: &str = "/repos/acme/shop/contents/orders/abc.json";

fn store(server: &MockServer) -> GitHubStore {
    GitHubStore::new(
        reqwest::Client::new(),
        GitHubSettings {
            token: Some("ghp_test".into()),
            repo: Some("acme/shop".into()),
            branch: "orders-branch".into(),
            api_url: server.uri(),
            ..GitHubSettings::default()
        },
    )
}

#[tokio::test]
async fn put_commits_base64_content_to_branch() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(FILE))
        .and(header("authorization", "Bearer ghp_test"))
        .and(header("accept", "application/vnd.github+json"))
        .and(body_partial_json(json!({
            "message": "chore: create order abc",
            "branch": "orders-branch",
            "content": STANDARD.encode("{\"id\":\"abc\"}"),
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "content": {} })))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .put("orders/abc.json", "{\"id\":\"abc\"}", "chore: create order abc")
        .await?;

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json()?;
    assert!(body.get("sha").is_none());
    Ok(())
}

#[tokio::test]
async fn get_decodes_wrapped_content() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let encoded = STANDARD.encode("{\n  \"status\": \"created\"\n}");
    let (head, tail) = encoded.split_at(8);
    Mock::given(method("GET"))
        .and(path(FILE))
        .and(query_param("ref", "orders-branch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "encoding": "base64",
            "content": format!("{head}\n{tail}\n"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = store(&server).get("orders/abc.json").await?;

    assert_eq!(file.sha, "3d21ec53a331a6f037a91c368710b99387d012c1");
    assert_eq!(file.content, "{\n  \"status\": \"created\"\n}");
    Ok(())
}

#[tokio::test]
async fn update_sends_sha_and_maps_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(FILE))
        .and(body_partial_json(json!({ "sha": "stale" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "orders/abc.json does not match stale"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server)
        .update("orders/abc.json", "{}", "chore: mark order abc as paid", "stale")
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Conflict { ref path } if path == "orders/abc.json"));
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FILE))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let err = store(&server).get("orders/abc.json").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn upstream_message_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid request." })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let store = store(&server);
    let put = store.put("orders/abc.json", "{}", "msg").await.unwrap_err();
    let get = store.get("orders/abc.json").await.unwrap_err();

    assert!(matches!(put, StoreError::Upstream { status: 422, .. }));
    assert_eq!(put.to_string(), "Invalid request.");
    assert_eq!(get.to_string(), "Failed to fetch order.");
}

#[tokio::test]
async fn missing_configuration_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let no_token = GitHubStore::new(
        reqwest::Client::new(),
        GitHubSettings {
            repo: Some("acme/shop".into()),
            api_url: server.uri(),
            ..GitHubSettings::default()
        },
    );
    let no_owner = GitHubStore::new(
        reqwest::Client::new(),
        GitHubSettings {
            token: Some("ghp_test".into()),
            repo: Some("shop".into()),
            api_url: server.uri(),
            ..GitHubSettings::default()
        },
    );

    assert!(matches!(
        no_token.put("orders/abc.json", "{}", "msg").await,
        Err(StoreError::Config(_))
    ));
    assert!(matches!(
        no_owner.put("orders/abc.json", "{}", "msg").await,
        Err(StoreError::Config(_))
    ));
}
