//! In-memory resolvers and fetchers shared by unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

use crate::{
    error::WeatherError,
    model::{Coordinate, GeocodeResult, RawAirQuality, RawWeather},
    provider::{GeoResolver, WeatherFetcher},
    units::UnitSystem,
};

pub fn raw_weather(temp: f64) -> RawWeather {
    serde_json::from_value(serde_json::json!({
        "main": {"temp": temp, "feels_like": temp - 1.0, "humidity": 70, "pressure": 1012},
        "wind": {"speed": 3.0},
        "visibility": 10000,
        "weather": [{"icon": "01d", "description": "clear sky"}],
        "name": "London",
        "sys": {"country": "GB"}
    }))
    .unwrap()
}

pub fn raw_air(aqi: u8) -> RawAirQuality {
    serde_json::from_value(serde_json::json!({"list": [{"main": {"aqi": aqi}}]})).unwrap()
}

#[derive(Debug, Default)]
pub struct FakeGeo {
    places: HashMap<String, GeocodeResult>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGeo {
    pub fn with_place(mut self, query: &str, name: &str, country: &str, coord: Coordinate) -> Self {
        self.places.insert(
            query.to_string(),
            GeocodeResult {
                coordinate: coord,
                matched_name: name.to_string(),
                country_code: country.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl GeoResolver for FakeGeo {
    async fn resolve(&self, place_name: &str) -> Result<GeocodeResult, WeatherError> {
        self.calls.lock().push(place_name.to_string());
        self.places
            .get(place_name)
            .cloned()
            .ok_or_else(|| WeatherError::NotFound(place_name.to_string()))
    }
}

fn reply_for(units: UnitSystem) -> RawWeather {
    raw_weather(match units {
        UnitSystem::Metric => 15.0,
        UnitSystem::Imperial => 59.0,
    })
}

type WeatherReply = Result<RawWeather, WeatherError>;

/// Replays queued replies. With an empty queue the temperature encodes the
/// requested unit: 15 for metric, 59 for imperial.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    replies: Mutex<VecDeque<WeatherReply>>,
    air_fails: bool,
    pub weather_calls: Mutex<Vec<(Coordinate, UnitSystem)>>,
}

impl FakeFetcher {
    pub fn failing_air() -> Self {
        Self {
            air_fails: true,
            ..Self::default()
        }
    }

    pub fn queue(&self, reply: WeatherReply) {
        self.replies.lock().push_back(reply);
    }

    pub fn weather_call_count(&self) -> usize {
        self.weather_calls.lock().len()
    }
}

#[async_trait]
impl WeatherFetcher for FakeFetcher {
    async fn fetch_current(
        &self,
        coordinate: Coordinate,
        units: UnitSystem,
    ) -> Result<RawWeather, WeatherError> {
        self.weather_calls.lock().push((coordinate, units));
        let queued = self.replies.lock().pop_front();
        queued.unwrap_or_else(|| Ok(reply_for(units)))
    }

    async fn fetch_air_quality(
        &self,
        _coordinate: Coordinate,
    ) -> Result<RawAirQuality, WeatherError> {
        if self.air_fails {
            Err(WeatherError::Upstream("Air quality data unavailable".into()))
        } else {
            Ok(raw_air(2))
        }
    }
}

/// Holds one weather request until [`release`](Self::release) is called.
/// Every other request answers at once, like [`FakeFetcher`] with an empty
/// queue.
#[derive(Debug, Default)]
pub struct GatedFetcher {
    gate: Notify,
    calls: AtomicUsize,
    held_call: usize,
    fail_held: bool,
}

impl GatedFetcher {
    /// Hold the `n`th weather request, counting from zero.
    pub fn holding(n: usize) -> Self {
        Self {
            held_call: n,
            ..Self::default()
        }
    }

    /// The held request fails with an upstream error once released.
    pub fn failing(mut self) -> Self {
        self.fail_held = true;
        self
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl WeatherFetcher for GatedFetcher {
    async fn fetch_current(
        &self,
        _coordinate: Coordinate,
        units: UnitSystem,
    ) -> Result<RawWeather, WeatherError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.held_call {
            self.gate.notified().await;
            if self.fail_held {
                return Err(WeatherError::Upstream("Weather API error: Bad Gateway".into()));
            }
        }
        Ok(reply_for(units))
    }

    async fn fetch_air_quality(
        &self,
        _coordinate: Coordinate,
    ) -> Result<RawAirQuality, WeatherError> {
        Ok(raw_air(1))
    }
}
