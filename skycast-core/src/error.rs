//! Error taxonomy for a single orchestration run.
//!
//! Every variant is terminal for the run that produced it. Nothing here is
//! retried automatically; the air-quality lookup is the one failure that the
//! orchestrator downgrades instead of returning.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("empty place name")]
    EmptyInput,

    #[error("search throttled")]
    Throttled,

    #[error("no geocoding match for '{0}'")]
    NotFound(String),

    #[error("{0} endpoint rejected the API key")]
    Auth(ApiService),

    #[error("upstream rate limit exceeded")]
    RateLimited,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("geolocation permission denied")]
    GeolocationDenied,

    #[error("geolocation unavailable")]
    GeolocationUnavailable,

    #[error("geolocation timed out")]
    GeolocationTimeout,

    #[error("malformed weather data: {0}")]
    Display(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A newer run published first; this run's result was dropped.
    #[error("result superseded by a newer request")]
    Superseded,
}

impl WeatherError {
    /// Message suitable for a transient on-screen notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => "Please enter a city name".to_string(),
            Self::Throttled => "Please wait a moment before making another request".to_string(),
            Self::NotFound(query) => {
                format!("City \"{query}\" not found. Please check spelling and try again.")
            }
            Self::Auth(ApiService::Geocoding) => {
                "Invalid API key. Please check your OpenWeatherMap API key.".to_string()
            }
            Self::Auth(ApiService::Weather) => {
                "Invalid API key. Please verify your OpenWeatherMap API key.".to_string()
            }
            Self::RateLimited => {
                "API rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            Self::Upstream(message) => message.clone(),
            Self::GeolocationDenied => {
                "Location access denied. Please allow location access and try again.".to_string()
            }
            Self::GeolocationUnavailable => "Location information is unavailable.".to_string(),
            Self::GeolocationTimeout => "Location request timed out.".to_string(),
            Self::Display(_) => "Error displaying weather data".to_string(),
            Self::Transport(e) if e.is_timeout() => {
                "The weather service took too long to respond. Please try again.".to_string()
            }
            Self::Transport(_) => {
                "Failed to fetch weather data. Please check your connection and try again."
                    .to_string()
            }
            Self::Superseded => String::new(),
        }
    }

    /// Silent errors are never shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Upstream service that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiService {
    Geocoding,
    Weather,
}

impl std::fmt::Display for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiService::Geocoding => f.write_str("geocoding"),
            ApiService::Weather => f.write_str("weather"),
        }
    }
}

/// Failure reported by a [`LocationSource`](crate::location::LocationSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    Denied,
    #[error("location unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
}

impl From<LocationError> for WeatherError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::Denied => WeatherError::GeolocationDenied,
            LocationError::Unavailable => WeatherError::GeolocationUnavailable,
            LocationError::Timeout => WeatherError::GeolocationTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_includes_query() {
        let msg = WeatherError::NotFound("Atlantis".into()).user_message();
        assert!(msg.contains("Atlantis"));
    }

    #[test]
    fn auth_message_depends_on_service() {
        assert_eq!(
            WeatherError::Auth(ApiService::Geocoding).user_message(),
            "Invalid API key. Please check your OpenWeatherMap API key."
        );
        assert_eq!(
            WeatherError::Auth(ApiService::Weather).user_message(),
            "Invalid API key. Please verify your OpenWeatherMap API key."
        );
    }

    #[test]
    fn upstream_message_is_passed_through() {
        let msg = WeatherError::Upstream("city not found".into()).user_message();
        assert_eq!(msg, "city not found");
    }

    #[test]
    fn location_errors_map_to_geolocation_kinds() {
        assert!(matches!(
            WeatherError::from(LocationError::Denied),
            WeatherError::GeolocationDenied
        ));
        assert!(matches!(
            WeatherError::from(LocationError::Unavailable),
            WeatherError::GeolocationUnavailable
        ));
        assert!(matches!(
            WeatherError::from(LocationError::Timeout),
            WeatherError::GeolocationTimeout
        ));
    }

    #[test]
    fn only_superseded_is_silent() {
        assert!(WeatherError::Superseded.is_silent());
        assert!(!WeatherError::Throttled.is_silent());
        assert!(!WeatherError::RateLimited.is_silent());
    }
}
