use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::instrument;

use crate::{
    config::{Config, Endpoints},
    error::{ApiService, WeatherError},
    model::{Coordinate, GeocodeResult, RawAirQuality, RawWeather},
    units::UnitSystem,
};

use super::{GeoResolver, WeatherFetcher};

/// OpenWeatherMap client covering geocoding, current weather and air pollution.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: String,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            endpoints,
            http,
        })
    }

    /// Build a client from config, reading the key override from the environment.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key(std::env::var(crate::config::API_KEY_ENV).ok())?;
        let client = Self::new(
            api_key,
            config.endpoints.clone(),
            config.request_timeout(),
        )?;
        Ok(client)
    }

    fn url(base: &str, path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    lat: f64,
    lon: f64,
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[async_trait]
impl GeoResolver for OpenWeatherClient {
    #[instrument(skip(self), level = "debug")]
    async fn resolve(&self, place_name: &str) -> Result<GeocodeResult, WeatherError> {
        let url = Self::url(&self.endpoints.geo_base, "direct");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", place_name),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                return Err(WeatherError::Auth(ApiService::Geocoding));
            }
            return Err(WeatherError::Upstream(format!(
                "Geocoding failed: {}",
                status_text(status)
            )));
        }

        let matches: Vec<OwGeoMatch> = decode(res, "geocoding").await?;
        let best = matches
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(place_name.to_string()))?;

        tracing::info!(
            "Found location: {}, {} ({}, {})",
            best.name,
            best.country,
            best.lat,
            best.lon
        );

        Ok(GeocodeResult {
            coordinate: Coordinate::new(best.lat, best.lon),
            matched_name: best.name,
            country_code: best.country,
        })
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_current(
        &self,
        coordinate: Coordinate,
        units: UnitSystem,
    ) -> Result<RawWeather, WeatherError> {
        let url = Self::url(&self.endpoints.weather_base, "weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", units.as_query().to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return decode(res, "current weather").await;
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(WeatherError::Auth(ApiService::Weather));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(WeatherError::RateLimited);
        }

        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OwErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Weather API error: {}", status_text(status)));
        Err(WeatherError::Upstream(message))
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_air_quality(
        &self,
        coordinate: Coordinate,
    ) -> Result<RawAirQuality, WeatherError> {
        let url = Self::url(&self.endpoints.weather_base, "air_pollution");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(WeatherError::Upstream(
                "Air quality data unavailable".to_string(),
            ));
        }

        decode(res, "air quality").await
    }
}

async fn decode<T: DeserializeOwned>(res: Response, what: &str) -> Result<T, WeatherError> {
    let body = res.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        WeatherError::Display(format!(
            "failed to parse {what} response: {e} (body: {})",
            truncate_body(&body)
        ))
    })
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
