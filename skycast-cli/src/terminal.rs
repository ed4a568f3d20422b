use chrono::Local;
use skycast_core::{ErrorBanner, Presenter, UnitSystem, WeatherSnapshot};
use std::time::Instant;

/// Renders snapshots as a text card on stdout and errors on stderr.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    banner: Option<ErrorBanner>,
}

impl TerminalPresenter {
    /// The current error notice, if it has not been dismissed yet.
    pub fn active_banner(&mut self, now: Instant) -> Option<&str> {
        if self.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.banner = None;
        }
        self.banner.as_ref().map(|b| b.message.as_str())
    }
}

impl Presenter for TerminalPresenter {
    fn show_loading(&mut self) {
        self.banner = None;
        println!("Searching...");
    }

    fn show_snapshot(&mut self, snapshot: &WeatherSnapshot) {
        self.banner = None;
        print!("{}", render_snapshot(snapshot));
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("⚠️  {message}");
        self.banner = Some(ErrorBanner::new(message, Instant::now()));
    }

    fn show_unit(&mut self, unit: UnitSystem) {
        let units = unit.display_units();
        println!(
            "Units: {} / {} (:u to switch)",
            units.temperature_symbol, units.wind_speed_label
        );
    }

    fn show_favorites(&mut self, favorites: &[String]) {
        if favorites.is_empty() {
            println!("No favorites saved.");
            return;
        }
        println!("Favorites:");
        for place in favorites {
            println!("  - {place}");
        }
    }
}

pub fn render_snapshot(snapshot: &WeatherSnapshot) -> String {
    let mut out = format!(
        "\n{}  {}\n   {}  {}\n",
        snapshot.condition.glyph(),
        snapshot.display_name,
        snapshot.formatted_temperature(),
        snapshot.title_condition()
    );
    out.push_str(&format!("   Feels like  {}\n", snapshot.formatted_feels_like()));
    out.push_str(&format!("   Humidity    {}%\n", snapshot.humidity_percent));
    out.push_str(&format!("   Wind        {}\n", snapshot.formatted_wind()));
    out.push_str(&format!("   Pressure    {} hPa\n", snapshot.pressure_hpa));
    out.push_str(&format!("   Visibility  {}\n", snapshot.formatted_visibility()));
    if let Some(label) = snapshot.air_quality_label() {
        out.push_str(&format!("   Air quality {label}\n"));
    }
    out.push_str(&format!(
        "   Updated     {}\n",
        snapshot.fetched_at.with_timezone(&Local).format("%H:%M")
    ));
    out
}
