use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{Coordinate, GeocodeResult, RawAirQuality, RawWeather},
    units::UnitSystem,
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Turns a free-text place name into its best coordinate match.
#[async_trait]
pub trait GeoResolver: Send + Sync + Debug {
    /// Only the first match is returned; zero matches is [`WeatherError::NotFound`].
    async fn resolve(&self, place_name: &str) -> Result<GeocodeResult, WeatherError>;
}

/// Read-only lookups of current conditions and air quality.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        coordinate: Coordinate,
        units: UnitSystem,
    ) -> Result<RawWeather, WeatherError>;

    async fn fetch_air_quality(&self, coordinate: Coordinate)
    -> Result<RawAirQuality, WeatherError>;
}
