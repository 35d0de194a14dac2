//! HttpGateway against a local mock server.

use indicator_editor::{
    GatewayConfig, GatewayError, HttpGateway, IndicatorGateway, ValueUpdate,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(GatewayConfig::new(format!("{}/api", server.uri()))).unwrap()
}

fn grid_body() -> serde_json::Value {
    json!({
        "rows": [
            {"factId": "f1", "dimensions": {"year": "2020"}, "value": 10, "isEmpty": false},
            {"factId": "f2", "dimensions": {"year": "2021"}, "value": null, "isEmpty": true}
        ],
        "dimensionColumns": ["year"],
        "indicatorName": "Literacy rate",
        "dataType": "decimal"
    })
}

#[tokio::test]
async fn test_fetch_values_decodes_grid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/indicators/7/values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grid_body()))
        .expect(1)
        .mount(&server)
        .await;

    let grid = gateway(&server).fetch_values("7").await.unwrap();

    assert_eq!(grid.indicator_name, "Literacy rate");
    assert_eq!(grid.dimension_columns, vec!["year".to_string()]);
    assert_eq!(grid.rows[0].value, Some(10.0));
    assert!(grid.rows[1].is_empty);
}

#[tokio::test]
async fn test_fetch_values_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/indicators/404/values"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = gateway(&server).fetch_values("404").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_fetch_values_server_error_uses_body_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/indicators/7/values"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "database unavailable"})),
        )
        .mount(&server)
        .await;

    let err = gateway(&server).fetch_values("7").await.unwrap_err();
    assert_eq!(err, GatewayError::Network("database unavailable".into()));
}

#[tokio::test]
async fn test_fetch_values_bad_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/indicators/7/values"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = gateway(&server).fetch_values("7").await.unwrap_err();
    assert!(matches!(err, GatewayError::Parse(_)));
}

#[tokio::test]
async fn test_submit_updates_puts_json_array() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/indicators/7/values"))
        .and(body_json(json!([
            {"factId": "f1", "newValue": 12.5},
            {"factId": "f2", "newValue": 3.0}
        ])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let updates = vec![
        ValueUpdate { fact_id: "f1".into(), new_value: 12.5 },
        ValueUpdate { fact_id: "f2".into(), new_value: 3.0 },
    ];
    gateway(&server).submit_updates("7", &updates).await.unwrap();
}

#[tokio::test]
async fn test_submit_rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/indicators/7/values"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "fact f1 was modified"})),
        )
        .mount(&server)
        .await;

    let updates = vec![ValueUpdate { fact_id: "f1".into(), new_value: 1.0 }];
    let err = gateway(&server).submit_updates("7", &updates).await.unwrap_err();
    assert_eq!(err, GatewayError::Validation("fact f1 was modified".into()));
}

#[tokio::test]
async fn test_submit_failure_without_body_uses_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/indicators/7/values"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let updates = vec![ValueUpdate { fact_id: "f1".into(), new_value: 1.0 }];
    let err = gateway(&server).submit_updates("7", &updates).await.unwrap_err();
    assert_eq!(err, GatewayError::Network("Service Unavailable".into()));
}

#[tokio::test]
async fn test_reference_collections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data-types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "code": "integer", "name": "Integer"},
            {"id": "2", "code": "decimal", "name": "Decimal"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/units"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currency": [{"id": "u1", "code": "usd", "name": "US Dollar", "symbol": "$"}],
            "share": [{"id": "u2", "code": "pct", "name": "Percent"}]
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let types = gateway.fetch_data_types().await.unwrap();
    assert_eq!(types[1].code, "decimal");

    let units = gateway.fetch_units().await.unwrap();
    assert_eq!(units["currency"][0].symbol.as_deref(), Some("$"));
    assert_eq!(units["share"][0].symbol, None);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on the discard port
    let gateway = HttpGateway::new(GatewayConfig::new("http://127.0.0.1:9").with_timeout_secs(2)).unwrap();
    let err = gateway.fetch_data_types().await.unwrap_err();
    assert!(matches!(err, GatewayError::Network(_)));
}
