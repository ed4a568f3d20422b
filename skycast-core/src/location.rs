//! Device position sources.
//!
//! A terminal has no geolocation API, so the sources here are either a fixed
//! configured position or an explicit "not supported". [`CachedLocation`]
//! gives any source the cached-position tolerance a browser would apply.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{fmt::Debug, time::Duration, time::Instant};

use crate::{error::LocationError, model::Coordinate};

/// Options for a one-shot position query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Upper bound on a single query; enforced by the caller.
    pub timeout: Duration,
    /// Maximum age of a previously obtained position that may be reused.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinate, LocationError>;
}

/// A position known ahead of time (configured home or command-line flags).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self, _: &PositionOptions) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Platform without any geolocation support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl LocationSource for NoGeolocation {
    async fn current_position(&self, _: &PositionOptions) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Reuses the last position while it is younger than `maximum_age`.
#[derive(Debug)]
pub struct CachedLocation<S> {
    inner: S,
    last: Mutex<Option<(Coordinate, Instant)>>,
}

impl<S: LocationSource> CachedLocation<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: LocationSource> LocationSource for CachedLocation<S> {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinate, LocationError> {
        let cached = *self.last.lock();
        let fresh = cached.filter(|(_, obtained_at)| obtained_at.elapsed() <= options.maximum_age);
        if let Some((coordinate, _)) = fresh {
            tracing::debug!("Reusing cached position {}", coordinate);
            return Ok(coordinate);
        }

        let coordinate = self.inner.current_position(options).await?;
        *self.last.lock() = Some((coordinate, Instant::now()));
        Ok(coordinate)
    }
}
