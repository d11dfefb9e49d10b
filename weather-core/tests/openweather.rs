//! OpenWeather provider against a wiremock server.

use std::{sync::Arc, time::Duration};

use weather_core::{
    Location, Units, WeatherClient, WeatherError, WeatherProvider, forecast,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn london() -> Location {
    Location::parse("London").unwrap()
}

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "name": "London",
        "dt": 1704110400,
        "sys": { "country": "GB" },
        "main": { "temp": 7.5, "feels_like": 5.1, "humidity": 81, "pressure": 1009 },
        "weather": [{ "description": "light rain", "icon": "10d" }],
        "wind": { "speed": 4.6 },
        "clouds": { "all": 75 }
    })
}

fn forecast_entry(dt: i64, dt_txt: &str, temp: f64, description: &str) -> serde_json::Value {
    serde_json::json!({
        "dt": dt,
        "dt_txt": dt_txt,
        "main": { "temp": temp, "feels_like": temp, "humidity": 70, "pressure": 1010 },
        "weather": [{ "description": description, "icon": "04d" }],
        "wind": { "speed": 3.0 }
    })
}

#[tokio::test]
async fn current_conditions_are_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", "KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let current = provider.current(&london()).await.unwrap();

    assert_eq!(current.provider, "openweather");
    assert_eq!(current.location_name, "London");
    assert_eq!(current.country, "GB");
    assert_eq!(current.temperature, 7.5);
    assert_eq!(current.humidity_pct, 81);
    assert_eq!(current.condition, "light rain");
    assert_eq!(current.icon, "10d");
    assert_eq!(current.wind_speed, 4.6);
    assert_eq!(current.pressure_hpa, 1009.0);
    assert_eq!(current.cloud_pct, 75);
    assert_eq!(current.observation_time.timestamp(), 1704110400);
    assert_eq!(current.native_units, Units::Metric);
}

#[tokio::test]
async fn not_found_maps_to_location_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let err = provider
        .current(&Location::parse("Nowhereville").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::LocationNotFound("Nowhereville".into()));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn bad_request_maps_to_invalid_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "cod": "400", "message": "Nothing to geocode" })),
        )
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let err = provider.current(&london()).await.unwrap_err();

    match err {
        WeatherError::InvalidRequest(msg) => assert!(msg.contains("Nothing to geocode")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_and_rate_limits_are_transient() {
    for status in [500u16, 503, 429] {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream trouble"))
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
        let err = provider.current(&london()).await.unwrap_err();

        assert!(
            matches!(err, WeatherError::ProviderUnavailable(ref msg) if msg.contains(&status.to_string())),
            "status {status} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn rejected_api_key_is_unauthorized_and_not_transient() {
    for status in [401u16, 403] {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({ "cod": status, "message": "Invalid API key" })),
            )
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::with_base_url("BAD".into(), server.uri());
        let err = provider.current(&london()).await.unwrap_err();

        assert!(
            matches!(err, WeatherError::Unauthorized(ref msg) if msg.contains("Invalid API key")),
            "status {status} gave {err:?}"
        );
        assert!(!err.is_transient());
    }
}

#[tokio::test]
async fn malformed_body_is_provider_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let err = provider.current(&london()).await.unwrap_err();

    assert!(matches!(err, WeatherError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn forecast_series_reduces_to_days() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": { "name": "London", "country": "GB" },
            "list": [
                forecast_entry(1704067200, "2024-01-01 00:00:00", 10.0, "clear sky"),
                forecast_entry(1704088800, "2024-01-01 06:00:00", 12.0, "few clouds"),
                forecast_entry(1704153600, "2024-01-02 00:00:00", 8.0, "overcast clouds"),
            ]
        })))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    let points = provider.forecast(&london()).await.unwrap();
    assert_eq!(points.len(), 3);

    let daily = forecast::reduce(&points);
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].date.to_string(), "2024-01-01");
    assert_eq!(daily[0].temperature, 10.0);
    assert_eq!(daily[0].condition, "clear sky");
    assert_eq!(daily[1].date.to_string(), "2024-01-02");
    assert_eq!(daily[1].temperature, 8.0);
}

#[tokio::test]
async fn empty_forecast_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "city": { "name": "London", "country": "GB" },
            "list": []
        })))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), server.uri());
    assert!(provider.forecast(&london()).await.unwrap().is_empty());
}

#[tokio::test]
async fn client_timeout_surfaces_as_provider_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = Arc::new(OpenWeatherProvider::with_base_url("KEY".into(), server.uri()));
    let client = WeatherClient::new(provider, Duration::from_millis(100));

    let err = client.current("London").await.unwrap_err();
    assert!(matches!(err, WeatherError::ProviderUnavailable(ref msg) if msg.contains("timed out")));
}
