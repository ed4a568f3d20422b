//! Request orchestration: place or position in, published snapshot out.
//!
//! One run moves through `Resolving` (name lookups only), `Fetching`,
//! `Merging` and `Published`, or stops in `Failed` from either of the first
//! two. A failed run never touches the published snapshot.
//!
//! Runs draw a ticket from a generation counter when they start. A run may
//! publish only if no run that started after it has already published, so a
//! slow response can never overwrite a newer snapshot.
//!
//! Publishing also moves the active unit to the snapshot's unit unless a
//! later toggle has already claimed it. The unit on screen therefore always
//! matches the published data once in-flight toggles settle.

use parking_lot::Mutex;
use std::{
    fmt,
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use crate::{
    config::{Config, DEFAULT_PLACE},
    error::WeatherError,
    location::{LocationSource, PositionOptions},
    model::{Coordinate, WeatherSnapshot},
    provider::{GeoResolver, WeatherFetcher},
    throttle::RequestThrottle,
    units::UnitSystem,
};

/// Why a fetch was started. Only explicit user searches are throttled;
/// startup, coordinate, device-position and unit-toggle fetches are assumed
/// to be low-frequency and bypass the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    UserSearch,
    Startup,
    Coordinates,
    Geolocation,
    UnitToggle,
}

impl FetchOrigin {
    pub fn is_throttled(self) -> bool {
        matches!(self, FetchOrigin::UserSearch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Resolving,
    Fetching,
    Merging,
    Published,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Resolving => "resolving",
            RunPhase::Fetching => "fetching",
            RunPhase::Merging => "merging",
            RunPhase::Published => "published",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Published {
    ticket: u64,
    snapshot: WeatherSnapshot,
}

#[derive(Debug)]
struct SessionState {
    unit: UnitSystem,
    /// Ticket of the toggle or publish that last set `unit`.
    unit_set_by: u64,
    current: Option<Published>,
    throttle: RequestThrottle,
}

/// Session object owning the active unit, the throttle and the current
/// snapshot. Constructed once per process.
#[derive(Debug)]
pub struct WeatherOrchestrator {
    geo: Arc<dyn GeoResolver>,
    fetcher: Arc<dyn WeatherFetcher>,
    default_place: String,
    favorites: Vec<String>,
    position_options: PositionOptions,
    next_ticket: AtomicU64,
    state: Mutex<SessionState>,
}

impl WeatherOrchestrator {
    pub fn new(geo: Arc<dyn GeoResolver>, fetcher: Arc<dyn WeatherFetcher>) -> Self {
        Self {
            geo,
            fetcher,
            default_place: DEFAULT_PLACE.to_string(),
            favorites: Vec::new(),
            position_options: PositionOptions::default(),
            next_ticket: AtomicU64::new(1),
            state: Mutex::new(SessionState {
                unit: UnitSystem::default(),
                unit_set_by: 0,
                current: None,
                throttle: RequestThrottle::default(),
            }),
        }
    }

    /// Apply the startup settings of a loaded config.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.default_place = config.default_place.clone();
        self.favorites = config.favorites.clone();
        self.state.get_mut().unit = config.units;
        self
    }

    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.state.get_mut().throttle = throttle;
        self
    }

    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.position_options = options;
        self
    }

    pub fn active_unit(&self) -> UnitSystem {
        self.state.lock().unit
    }

    pub fn current_snapshot(&self) -> Option<WeatherSnapshot> {
        self.state
            .lock()
            .current
            .as_ref()
            .map(|p| p.snapshot.clone())
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    pub fn default_place(&self) -> &str {
        &self.default_place
    }

    /// User-initiated search by place name. Subject to the search throttle.
    pub async fn load_by_name(&self, name: &str) -> Result<WeatherSnapshot, WeatherError> {
        self.load_place(name, FetchOrigin::UserSearch).await
    }

    /// Fetch weather for a coordinate in `unit`, publish and return it.
    /// A published snapshot makes `unit` the active unit.
    pub async fn load_by_coordinate(
        &self,
        coordinate: Coordinate,
        unit: UnitSystem,
        display_name: Option<String>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.load_coordinate(coordinate, unit, display_name, FetchOrigin::Coordinates)
            .await
    }

    /// Flip the active unit and refetch the current snapshot in it.
    ///
    /// Returns `Ok(None)` when nothing has been published yet. If the refetch
    /// fails the flip is rolled back, unless another toggle or a newer
    /// publish has set the unit in the meantime.
    pub async fn toggle_unit(&self) -> Result<Option<WeatherSnapshot>, WeatherError> {
        let (ticket, previous, next, current) = {
            let mut state = self.state.lock();
            let ticket = self.take_ticket();
            let previous = state.unit;
            state.unit = previous.toggled();
            state.unit_set_by = ticket;
            let current = state
                .current
                .as_ref()
                .map(|p| (p.snapshot.coordinate, p.snapshot.display_name.clone()));
            (ticket, previous, state.unit, current)
        };
        tracing::info!("Unit changed to {}", next);

        let Some((coordinate, display_name)) = current else {
            return Ok(None);
        };

        let result = self
            .fetch_and_publish(
                ticket,
                FetchOrigin::UnitToggle,
                coordinate,
                next,
                Some(display_name),
            )
            .await;
        match result {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(WeatherError::Superseded) => Err(WeatherError::Superseded),
            Err(e) => {
                let mut state = self.state.lock();
                if state.unit_set_by == ticket {
                    state.unit = previous;
                    tracing::warn!("Unit refresh failed, reverted to {}: {}", previous, e);
                } else {
                    tracing::warn!("Unit refresh failed after a newer change: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Weather at the device position; geolocation failures are returned.
    pub async fn load_current_location(
        &self,
        source: &dyn LocationSource,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let coordinate = self.locate(source).await?;
        tracing::info!("Location detected: {}", coordinate);
        self.load_coordinate(coordinate, self.active_unit(), None, FetchOrigin::Geolocation)
            .await
    }

    /// Launch policy: device position first, the default place otherwise.
    pub async fn startup(
        &self,
        source: &dyn LocationSource,
    ) -> Result<WeatherSnapshot, WeatherError> {
        match self.locate(source).await {
            Ok(coordinate) => {
                tracing::info!("Location detected: {}", coordinate);
                let unit = self.active_unit();
                self.load_coordinate(coordinate, unit, None, FetchOrigin::Geolocation)
                    .await
            }
            Err(e) => {
                tracing::warn!(
                    "Location unavailable ({}), loading {} as default",
                    e,
                    self.default_place
                );
                self.load_place(&self.default_place, FetchOrigin::Startup)
                    .await
            }
        }
    }

    async fn locate(&self, source: &dyn LocationSource) -> Result<Coordinate, WeatherError> {
        let options = self.position_options;
        match tokio::time::timeout(options.timeout, source.current_position(&options)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(WeatherError::GeolocationTimeout),
        }
    }

    async fn load_place(
        &self,
        name: &str,
        origin: FetchOrigin,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherError::EmptyInput);
        }

        if origin.is_throttled() && !self.state.lock().throttle.try_acquire(Instant::now()) {
            tracing::debug!("Search for '{}' refused by throttle", name);
            return Err(WeatherError::Throttled);
        }

        let ticket = self.take_ticket();
        tracing::debug!(ticket, phase = %RunPhase::Resolving, "Searching weather for: {}", name);

        let found = self.geo.resolve(name).await.inspect_err(|e| {
            tracing::debug!(ticket, phase = %RunPhase::Failed, "Resolution failed: {}", e);
        })?;

        let unit = self.active_unit();
        self.fetch_and_publish(ticket, origin, found.coordinate, unit, Some(found.display_name()))
            .await
    }

    async fn load_coordinate(
        &self,
        coordinate: Coordinate,
        unit: UnitSystem,
        display_name: Option<String>,
        origin: FetchOrigin,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let ticket = self.take_ticket();
        self.fetch_and_publish(ticket, origin, coordinate, unit, display_name)
            .await
    }

    async fn fetch_and_publish(
        &self,
        ticket: u64,
        origin: FetchOrigin,
        coordinate: Coordinate,
        unit: UnitSystem,
        display_name: Option<String>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        tracing::debug!(
            ticket,
            ?origin,
            phase = %RunPhase::Fetching,
            "Fetching weather for {} in {}",
            coordinate,
            unit
        );

        let (weather, air) = tokio::join!(
            self.fetcher.fetch_current(coordinate, unit),
            self.fetcher.fetch_air_quality(coordinate),
        );

        let weather = weather.inspect_err(|e| {
            tracing::debug!(ticket, phase = %RunPhase::Failed, "Weather fetch failed: {}", e);
        })?;

        let air = match air {
            Ok(air) => Some(air),
            Err(e) => {
                tracing::warn!("Air quality unavailable for {}: {}", coordinate, e);
                None
            }
        };

        tracing::debug!(ticket, phase = %RunPhase::Merging, "Merging weather data");
        let snapshot = WeatherSnapshot::merge(coordinate, unit, weather, air, display_name)?;

        self.publish(ticket, snapshot)
    }

    fn publish(
        &self,
        ticket: u64,
        snapshot: WeatherSnapshot,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let mut state = self.state.lock();
        let newer = state.current.as_ref().map(|p| p.ticket).filter(|&t| t > ticket);
        if let Some(newer) = newer {
            tracing::debug!(
                ticket,
                newer,
                "Dropping stale result for {}",
                snapshot.display_name
            );
            return Err(WeatherError::Superseded);
        }

        if ticket >= state.unit_set_by {
            state.unit = snapshot.unit_system;
            state.unit_set_by = ticket;
        }
        state.current = Some(Published {
            ticket,
            snapshot: snapshot.clone(),
        });
        tracing::info!(
            ticket,
            phase = %RunPhase::Published,
            "Weather loaded for {}",
            snapshot.display_name
        );
        Ok(snapshot)
    }

    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }
}
