use std::time::{Duration, Instant};

use crate::{model::WeatherSnapshot, units::UnitSystem};

/// How long an error notice stays visible.
pub const ERROR_DISMISS_AFTER: Duration = Duration::from_secs(7);

/// Rendering side of the client. The core only pushes into it.
pub trait Presenter {
    fn show_loading(&mut self);

    fn show_snapshot(&mut self, snapshot: &WeatherSnapshot);

    fn show_error(&mut self, message: &str);

    /// Reflect the active unit on the unit control.
    fn show_unit(&mut self, unit: UnitSystem);

    fn show_favorites(&mut self, favorites: &[String]);
}

/// A transient error notice with a fixed dismissal deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    shown_at: Instant,
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            shown_at: now,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= ERROR_DISMISS_AFTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_expires_after_fixed_interval() {
        let now = Instant::now();
        let banner = ErrorBanner::new("Location request timed out.", now);

        assert!(!banner.is_expired(now));
        assert!(!banner.is_expired(now + Duration::from_millis(6999)));
        assert!(banner.is_expired(now + ERROR_DISMISS_AFTER));
    }
}
