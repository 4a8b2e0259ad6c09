// Integration tests for `DeconzClient` against a mocked gateway.

use maplit::btreemap;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use showbridge::backend::deconz::{DeconzClient, LightWrite, plan_writes};
use showbridge::config::DeconzServer;
use showbridge::error::ApiError;
use showbridge::registry::DeviceRegistry;

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeconzClient) {
    let server = MockServer::start().await;
    let addr = server.address();
    let config = DeconzServer {
        host: addr.ip().to_string(),
        port: addr.port(),
        api_key: "testkey".to_string(),
        poll_interval_secs: None,
        press_format: deconz::button::PressFormat::Semantic,
    };
    let client = DeconzClient::new(&config).unwrap();
    (server, client)
}

fn light_json(name: &str, on: bool) -> serde_json::Value {
    json!({
        "name": name,
        "type": "Dimmable light",
        "state": {"on": on, "bri": 77, "reachable": true},
        "uniqueid": "00:0b:57:ff:fe:93:6e:11-01"
    })
}

// ── Read paths ──────────────────────────────────────────────────────

#[tokio::test]
async fn lights_are_fetched_under_the_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": light_json("Hall lamp", true),
            "2": light_json("Spot", false),
        })))
        .mount(&server)
        .await;

    let lights = client.get_lights().await.unwrap();

    assert_eq!(lights.len(), 2);
    assert_eq!(lights["1"].name, "Hall lamp");
    assert_eq!(lights["1"].state.on, Some(true));
    assert_eq!(lights["2"].state.on, Some(false));
}

#[tokio::test]
async fn single_light_fetch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/lights/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(light_json("Desk lamp", false)))
        .mount(&server)
        .await;

    let light = client.get_light("7").await.unwrap();
    assert_eq!(light.name, "Desk lamp");
    assert_eq!(light.state.on, Some(false));
}

#[tokio::test]
async fn sensors_snapshot_includes_config_and_state() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/sensors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "2": {
                "name": "Hall switch",
                "type": "ZHASwitch",
                "config": {"battery": 80, "reachable": true},
                "state": {"buttonevent": 1002, "lastupdated": "2024-03-01T12:00:00.123"}
            }
        })))
        .mount(&server)
        .await;

    let sensors = client.get_sensors().await.unwrap();
    assert_eq!(sensors["2"].config.battery, Some(80));
    assert_eq!(sensors["2"].state.buttonevent, Some(1002));
}

#[tokio::test]
async fn gateway_config_reveals_the_websocket_port() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "deCONZ-GW",
            "apiversion": "1.16.0",
            "websocketport": 4443
        })))
        .mount(&server)
        .await;

    let config = client.get_gateway_config().await.unwrap();
    assert_eq!(config.websocketport, 4443);
}

// ── Write path ──────────────────────────────────────────────────────

#[tokio::test]
async fn switching_a_light_puts_the_on_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/testkey/lights/1/state"))
        .and(body_json(json!({"on": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"success": {"/lights/1/state/on": true}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    client.set_light_on("1", true).await.unwrap();
}

// ── Failure mapping ─────────────────────────────────────────────────

#[tokio::test]
async fn non_success_status_names_the_operation() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/lights"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!([
            {"error": {"type": 1, "address": "/", "description": "unauthorized user"}}
        ])))
        .mount(&server)
        .await;

    let err = client.get_lights().await.unwrap_err();
    match err {
        ApiError::HubStatus { operation, status } => {
            assert_eq!(operation, "GET /lights");
            assert_eq!(status.as_u16(), 403);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn invalid_json_surfaces_as_a_request_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/sensors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client.get_sensors().await.unwrap_err();
    assert!(matches!(err, ApiError::HubRequest { .. }), "got: {err}");
}

// ── End to end: snapshot, delta write, refresh, settle ──────────────

#[tokio::test]
async fn one_corrective_write_then_quiescence() {
    let (server, client) = setup().await;
    let mut registry = DeviceRegistry::new();

    Mock::given(method("GET"))
        .and(path("/api/testkey/lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": light_json("Lamp", false),
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/testkey/lights/1/state"))
        .and(body_json(json!({"on": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/testkey/lights/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(light_json("Lamp", true)))
        .expect(1)
        .mount(&server)
        .await;

    // Seed the cache, then the controller asks for the lamp to be on.
    registry.apply_light_snapshot(client.get_lights().await.unwrap());
    let desired = btreemap! {"Lamp".to_string() => true};

    let plan = plan_writes(&desired, &registry);
    assert_eq!(
        plan.writes,
        vec![LightWrite {
            light_id: "1".to_string(),
            on: true,
        }]
    );
    for write in &plan.writes {
        client.set_light_on(&write.light_id, write.on).await.unwrap();
    }

    // The hub pushes a change notification for the light; the payload is
    // ignored and a fresh read lands in the cache instead.
    let light = client.get_light("1").await.unwrap();
    registry.apply_light_refresh("1", light);
    assert_eq!(registry.light("1").unwrap().on, Some(true));

    // Desired and cached states now agree: nothing further to write.
    assert!(plan_writes(&desired, &registry).writes.is_empty());
}
