use std::time::{Duration, Instant};

/// Minimum gap between two user-initiated searches.
pub const MIN_SEARCH_INTERVAL: Duration = Duration::from_millis(1000);

/// Client-side gate for user-initiated searches.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(MIN_SEARCH_INTERVAL)
    }
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Records `now` and returns `true` if at least `min_interval` has passed
    /// since the last recorded request. A refusal leaves the state unchanged.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let within_window = self
            .last_request
            .is_some_and(|last| now.saturating_duration_since(last) < self.min_interval);
        if within_window {
            return false;
        }

        self.last_request = Some(now);
        true
    }

    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_is_always_allowed() {
        let mut throttle = RequestThrottle::default();
        let now = Instant::now();

        assert!(throttle.try_acquire(now));
        assert_eq!(throttle.last_request(), Some(now));
    }

    #[test]
    fn refusal_inside_window_keeps_timestamp() {
        let mut throttle = RequestThrottle::default();
        let start = Instant::now();
        assert!(throttle.try_acquire(start));

        assert!(!throttle.try_acquire(start + Duration::from_millis(999)));
        assert_eq!(throttle.last_request(), Some(start));

        // Still measured from the first accepted request, not the refused one.
        assert!(throttle.try_acquire(start + Duration::from_millis(1000)));
        assert_eq!(
            throttle.last_request(),
            Some(start + Duration::from_millis(1000))
        );
    }

    #[test]
    fn custom_interval_is_respected() {
        let mut throttle = RequestThrottle::new(Duration::from_millis(50));
        let start = Instant::now();

        assert!(throttle.try_acquire(start));
        assert!(!throttle.try_acquire(start + Duration::from_millis(10)));
        assert!(throttle.try_acquire(start + Duration::from_millis(60)));
    }

    #[test]
    fn clock_going_backwards_is_refused() {
        let mut throttle = RequestThrottle::default();
        let later = Instant::now() + Duration::from_secs(5);
        assert!(throttle.try_acquire(later));

        assert!(!throttle.try_acquire(later - Duration::from_secs(1)));
        assert_eq!(throttle.last_request(), Some(later));
    }
}
