use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Measurement system requested from the upstream service.
///
/// The service converts values server-side, so a snapshot's numbers are only
/// meaningful together with the system they were fetched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Labels used when formatting values of a given [`UnitSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayUnits {
    pub temperature_symbol: &'static str,
    pub wind_speed_label: &'static str,
}

impl UnitSystem {
    /// Value of the `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn display_units(self) -> DisplayUnits {
        match self {
            UnitSystem::Metric => DisplayUnits {
                temperature_symbol: "°C",
                wind_speed_label: "m/s",
            },
            UnitSystem::Imperial => DisplayUnits {
                temperature_symbol: "°F",
                wind_speed_label: "mph",
            },
        }
    }

    /// Identity today: the upstream service already returns temperatures in
    /// the requested system. Local conversion belongs here if that changes.
    pub fn convert_temperature(self, value: f64) -> f64 {
        value
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "celsius" | "c" => Ok(UnitSystem::Metric),
            "imperial" | "fahrenheit" | "f" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}
