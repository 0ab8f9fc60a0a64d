#![allow(clippy::unwrap_used)]
// Integration tests for `ThingsClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lightsync_api::{Error, ThingsClient, TlsMode, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ThingsClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/lights/", server.uri())).unwrap();
    let client =
        ThingsClient::with_client(reqwest::Client::new(), base_url, Duration::from_secs(30));
    (server, client)
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_groups() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/get_groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Kitchen", "lights": ["KitchenCeiling", "KitchenCounter"] },
            { "name": "Others", "lights": [] }
        ])))
        .mount(&server)
        .await;

    let groups = client.list_groups().await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "Kitchen");
    assert_eq!(groups[0].members, vec!["KitchenCeiling", "KitchenCounter"]);
    assert!(groups[1].members.is_empty());
}

#[tokio::test]
async fn test_list_lights() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/get_lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "thing_name": "KitchenCeiling", "state": true, "brightness": 200 }
        ])))
        .mount(&server)
        .await;

    let lights = client.list_lights().await.unwrap();

    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0].thing_name, "KitchenCeiling");
    assert_eq!(lights[0].fields["brightness"], 200);
}

#[tokio::test]
async fn test_metadata_hash_numeric() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/z2m/get_known_things_hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(981_273)))
        .mount(&server)
        .await;

    assert_eq!(client.metadata_hash().await.unwrap(), "981273");
}

#[tokio::test]
async fn test_metadata_encodes_thing_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/z2m/meta/Desk%20Lamp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Desk Lamp",
            "model": "LED1623G12",
            "actions": { "brightness": { "value": { "meta": { "value_min": 0 } } } }
        })))
        .mount(&server)
        .await;

    let meta = client.metadata("Desk Lamp").await.unwrap();
    assert_eq!(meta.model.as_deref(), Some("LED1623G12"));
    assert!(meta.actions.unwrap().contains_key("brightness"));
}

#[tokio::test]
async fn test_push_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/get_ws_url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "url": "ws://home.local:4321/ws" })),
        )
        .mount(&server)
        .await;

    assert_eq!(
        client.push_endpoint().await.unwrap(),
        "ws://home.local:4321/ws"
    );
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_sends_partial_state() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/lights/z2m/set/KitchenCeiling"))
        .and(body_json(json!({ "brightness": 40 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = serde_json::Map::new();
    fields.insert("brightness".into(), json!(40));
    client.set("KitchenCeiling", &fields).await.unwrap();
}

#[tokio::test]
async fn test_all_lights_off() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/lights/all_lights_off/prefix/Kitchen"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.all_lights_off("Kitchen").await.unwrap();
}

#[tokio::test]
async fn test_trigger_absolute_url() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/scenes/movie"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .trigger(&format!("{}/scenes/movie", server.uri()))
        .await
        .unwrap();
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/get_switches"))
        .respond_with(ResponseTemplate::new(503).set_body_string("z2m not ready"))
        .mount(&server)
        .await;

    let result = client.list_switches().await;

    match result {
        Err(Error::Http { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "z2m not ready");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/lights/get_lights"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_lights().await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_slow_server_reports_configured_timeout() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/lights/", server.uri())).unwrap();
    let transport = TransportConfig {
        tls: TlsMode::System,
        timeout: Duration::from_secs(1),
    };
    let client = ThingsClient::new(base_url, &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/lights/get_groups"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let result = client.list_groups().await;

    match result {
        Err(Error::Timeout { timeout_secs }) => assert_eq!(timeout_secs, 1),
        other => panic!("expected Timeout error, got: {other:?}"),
    }
}
