//! Core library for the `skycast` weather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap geocoding / weather / air-quality client
//! - The orchestrator that sequences lookups and owns the current snapshot
//! - The presenter boundary and command controller used by front-ends
//!
//! It is used by `skycast-cli`, but does not depend on any particular UI.

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod presenter;
pub mod provider;
pub mod throttle;
pub mod units;

#[cfg(test)]
mod test_support;

pub use config::{Config, Endpoints};
pub use controller::{UiCommand, WeatherController};
pub use error::{ApiService, LocationError, WeatherError};
pub use location::{CachedLocation, FixedLocation, LocationSource, NoGeolocation, PositionOptions};
pub use model::{AirQuality, ConditionIcon, Coordinate, GeocodeResult, WeatherSnapshot};
pub use orchestrator::{FetchOrigin, WeatherOrchestrator};
pub use presenter::{ErrorBanner, Presenter};
pub use provider::{GeoResolver, OpenWeatherClient, WeatherFetcher};
pub use throttle::RequestThrottle;
pub use units::{DisplayUnits, UnitSystem};
