//! End-to-end runs of the orchestrator against a mocked OpenWeatherMap.

use std::{sync::Arc, time::Duration};

use skycast_core::{
    Coordinate, Endpoints, OpenWeatherClient, UnitSystem, WeatherError, WeatherOrchestrator,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn london_body() -> serde_json::Value {
    serde_json::json!({
        "main": {"temp": 15, "feels_like": 14, "humidity": 70, "pressure": 1012},
        "wind": {"speed": 3},
        "visibility": 10000,
        "weather": [{"icon": "01d", "description": "clear sky"}],
        "name": "London",
        "sys": {"country": "GB"}
    })
}

fn orchestrator_for(server: &MockServer) -> WeatherOrchestrator {
    let endpoints = Endpoints {
        geo_base: format!("{}/geo/1.0", server.uri()),
        weather_base: format!("{}/data/2.5", server.uri()),
    };
    let client = Arc::new(
        OpenWeatherClient::new("test_key".into(), endpoints, Duration::from_secs(5)).unwrap(),
    );
    WeatherOrchestrator::new(client.clone(), client)
}

async fn mount_weather(server: &MockServer, units: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", units))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_air(server: &MockServer, aqi: u8) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"list": [{"main": {"aqi": aqi}}]})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_by_coordinate_publishes_london() {
    let server = MockServer::start().await;
    mount_weather(&server, "metric", london_body()).await;
    mount_air(&server, 2).await;

    let orch = orchestrator_for(&server);
    let snap = orch
        .load_by_coordinate(Coordinate::new(51.5, -0.12), UnitSystem::Metric, None)
        .await
        .unwrap();

    assert_eq!(snap.temperature, 15.0);
    assert_eq!(snap.air_quality_index, Some(2));
    assert_eq!(snap.air_quality_label(), Some("Fair"));
    assert_eq!(snap.display_units().wind_speed_label, "m/s");
    assert_eq!(snap.display_name, "London, GB");
    assert_eq!(orch.current_snapshot(), Some(snap));
}

#[tokio::test]
async fn test_load_by_name_not_found_skips_weather() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = orchestrator_for(&server)
        .load_by_name("Atlantis")
        .await
        .unwrap_err();

    assert!(matches!(&err, WeatherError::NotFound(q) if q == "Atlantis"));
    assert!(err.user_message().contains("Atlantis"));
}

#[tokio::test]
async fn test_rate_limit_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    mount_weather(&server, "metric", london_body()).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_air(&server, 1).await;

    let orch = orchestrator_for(&server);
    let first = orch
        .load_by_coordinate(Coordinate::new(51.5, -0.12), UnitSystem::Metric, None)
        .await
        .unwrap();

    let err = orch.toggle_unit().await.unwrap_err();

    assert!(matches!(err, WeatherError::RateLimited));
    assert_eq!(orch.active_unit(), UnitSystem::Metric);
    assert_eq!(orch.current_snapshot(), Some(first));
}

#[tokio::test]
async fn test_air_quality_outage_still_publishes() {
    let server = MockServer::start().await;
    mount_weather(&server, "metric", london_body()).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let orch = orchestrator_for(&server);
    let snap = orch
        .load_by_coordinate(Coordinate::new(51.5, -0.12), UnitSystem::Metric, None)
        .await
        .unwrap();

    assert_eq!(snap.air_quality_index, None);
    assert!(orch.current_snapshot().is_some());
}

#[tokio::test]
async fn test_search_then_toggle_uses_resolved_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"lat": 51.5, "lon": -0.12, "name": "London", "country": "GB"}
        ])))
        .mount(&server)
        .await;
    mount_weather(&server, "metric", london_body()).await;
    let mut imperial = london_body();
    imperial["main"]["temp"] = serde_json::json!(59);
    mount_weather(&server, "imperial", imperial).await;
    mount_air(&server, 3).await;

    let orch = orchestrator_for(&server);
    let searched = orch.load_by_name("London").await.unwrap();
    let toggled = orch.toggle_unit().await.unwrap().unwrap();

    assert_eq!(searched.coordinate, Coordinate::new(51.5, -0.12));
    assert_eq!(toggled.coordinate, searched.coordinate);
    assert_eq!(toggled.display_name, "London, GB");
    assert_eq!(toggled.temperature, 59.0);
    assert_eq!(toggled.formatted_temperature(), "59°F");
    assert_eq!(toggled.air_quality_label(), Some("Moderate"));
}
