use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    error::WeatherError,
    units::{DisplayUnits, UnitSystem},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Best geocoding match for a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub coordinate: Coordinate,
    pub matched_name: String,
    pub country_code: String,
}

impl GeocodeResult {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.matched_name, self.country_code)
    }
}

/// Current-conditions payload as returned by the weather endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWeather {
    #[serde(default)]
    pub name: String,
    pub main: RawMain,
    #[serde(default)]
    pub wind: Option<RawWind>,
    #[serde(default)]
    pub visibility: Option<u32>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    #[serde(default)]
    pub sys: Option<RawSys>,
    #[serde(default)]
    pub coord: Option<RawCoord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSys {
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCoord {
    pub lat: f64,
    pub lon: f64,
}

/// Air-pollution payload; only the first entry's index is consulted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAirQuality {
    #[serde(default)]
    pub list: Vec<RawAirQualityEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAirQualityEntry {
    pub main: RawAirQualityMain,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAirQualityMain {
    pub aqi: u8,
}

impl RawAirQuality {
    pub fn index(&self) -> Option<u8> {
        self.list.first().map(|entry| entry.main.aqi)
    }
}

/// Ordered air-quality bands of the 1..=5 upstream index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AirQuality {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AirQuality {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Good),
            2 => Some(Self::Fair),
            3 => Some(Self::Moderate),
            4 => Some(Self::Poor),
            5 => Some(Self::VeryPoor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    pub fn label_for_index(index: u8) -> &'static str {
        Self::from_index(index).map_or("Unknown", |aq| aq.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    ClearSky,
    FewClouds,
    ScatteredClouds,
    BrokenClouds,
    ShowerRain,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Day,
    Night,
}

/// Upstream icon code such as `01d`, parsed without a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConditionIcon {
    pub kind: ConditionKind,
    pub period: DayPeriod,
}

impl ConditionIcon {
    pub fn parse(code: &str) -> Result<Self, WeatherError> {
        let unknown = || WeatherError::Display(format!("unrecognized condition icon '{code}'"));

        let (digits, suffix) = code.split_at_checked(2).ok_or_else(unknown)?;
        let kind = match digits {
            "01" => ConditionKind::ClearSky,
            "02" => ConditionKind::FewClouds,
            "03" => ConditionKind::ScatteredClouds,
            "04" => ConditionKind::BrokenClouds,
            "09" => ConditionKind::ShowerRain,
            "10" => ConditionKind::Rain,
            "11" => ConditionKind::Thunderstorm,
            "13" => ConditionKind::Snow,
            "50" => ConditionKind::Mist,
            _ => return Err(unknown()),
        };
        let period = match suffix {
            "d" => DayPeriod::Day,
            "n" => DayPeriod::Night,
            _ => return Err(unknown()),
        };

        Ok(Self { kind, period })
    }

    pub fn code(&self) -> String {
        let digits = match self.kind {
            ConditionKind::ClearSky => "01",
            ConditionKind::FewClouds => "02",
            ConditionKind::ScatteredClouds => "03",
            ConditionKind::BrokenClouds => "04",
            ConditionKind::ShowerRain => "09",
            ConditionKind::Rain => "10",
            ConditionKind::Thunderstorm => "11",
            ConditionKind::Snow => "13",
            ConditionKind::Mist => "50",
        };
        let suffix = match self.period {
            DayPeriod::Day => "d",
            DayPeriod::Night => "n",
        };
        format!("{digits}{suffix}")
    }

    pub fn glyph(&self) -> &'static str {
        match (self.kind, self.period) {
            (ConditionKind::ClearSky, DayPeriod::Day) => "☀️",
            (ConditionKind::ClearSky, DayPeriod::Night) => "🌙",
            (ConditionKind::FewClouds, DayPeriod::Day) => "⛅",
            (ConditionKind::FewClouds, DayPeriod::Night) => "☁️",
            (ConditionKind::ScatteredClouds | ConditionKind::BrokenClouds, _) => "☁️",
            (ConditionKind::ShowerRain, _) => "🌦️",
            (ConditionKind::Rain, _) => "🌧️",
            (ConditionKind::Thunderstorm, _) => "⛈️",
            (ConditionKind::Snow, _) => "❄️",
            (ConditionKind::Mist, _) => "🌫️",
        }
    }
}

impl TryFrom<String> for ConditionIcon {
    type Error = WeatherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ConditionIcon> for String {
    fn from(icon: ConditionIcon) -> Self {
        icon.code()
    }
}

/// The merged result of one successful orchestration run.
///
/// Numeric fields are in `unit_system` as supplied by the service; they are
/// never converted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coordinate: Coordinate,
    pub display_name: String,
    pub country_code: String,
    pub unit_system: UnitSystem,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_percent: u8,
    pub wind_speed: f64,
    pub pressure_hpa: u32,
    pub visibility_meters: Option<u32>,
    pub condition: ConditionIcon,
    pub condition_text: String,
    pub air_quality_index: Option<u8>,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Merge a weather payload and an optional air-quality payload.
    ///
    /// `coordinate` is the one the request was made for, not the one echoed
    /// back by the service.
    pub fn merge(
        coordinate: Coordinate,
        unit_system: UnitSystem,
        weather: RawWeather,
        air: Option<RawAirQuality>,
        display_name_override: Option<String>,
    ) -> Result<Self, WeatherError> {
        let condition = weather
            .weather
            .first()
            .ok_or_else(|| WeatherError::Display("response has no weather conditions".into()))?;
        let icon = ConditionIcon::parse(&condition.icon)?;
        let condition_text = condition.description.clone();

        let country_code = weather.sys.map(|sys| sys.country).unwrap_or_default();
        let display_name = match display_name_override {
            Some(name) => name,
            None if country_code.is_empty() => weather.name.clone(),
            None => format!("{}, {}", weather.name, country_code),
        };

        Ok(Self {
            coordinate,
            display_name,
            country_code,
            unit_system,
            temperature: weather.main.temp,
            feels_like: weather.main.feels_like,
            humidity_percent: weather.main.humidity,
            wind_speed: weather.wind.map_or(0.0, |wind| wind.speed),
            pressure_hpa: weather.main.pressure,
            visibility_meters: weather.visibility,
            condition: icon,
            condition_text,
            air_quality_index: air.and_then(|aq| aq.index()),
            fetched_at: Utc::now(),
        })
    }

    pub fn display_units(&self) -> DisplayUnits {
        self.unit_system.display_units()
    }

    pub fn air_quality_label(&self) -> Option<&'static str> {
        self.air_quality_index.map(AirQuality::label_for_index)
    }

    pub fn formatted_temperature(&self) -> String {
        format_temperature(self.unit_system, self.temperature)
    }

    pub fn formatted_feels_like(&self) -> String {
        format_temperature(self.unit_system, self.feels_like)
    }

    pub fn formatted_wind(&self) -> String {
        format!(
            "{} {}",
            round_half_up(self.wind_speed),
            self.display_units().wind_speed_label
        )
    }

    pub fn formatted_visibility(&self) -> String {
        match self.visibility_meters {
            Some(meters) if meters > 0 => {
                format!("{} km", round_half_up(f64::from(meters) / 1000.0))
            }
            _ => "N/A km".to_string(),
        }
    }

    /// Condition text with each word capitalized.
    pub fn title_condition(&self) -> String {
        self.condition_text
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn format_temperature(unit: UnitSystem, value: f64) -> String {
    format!(
        "{}{}",
        round_half_up(unit.convert_temperature(value)),
        unit.display_units().temperature_symbol
    )
}

/// Rounds halves toward positive infinity and never yields `-0`.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor() + 0.0
}
