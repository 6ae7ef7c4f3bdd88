//! Device location: the `LocationProvider` seam plus fixed and simulated
//! providers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bazaar_common::PresenceError;
use futures_util::stream::{self, BoxStream, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geo;

/// A single location fix in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Great-circle distance to another fix in meters.
    pub fn distance_m(&self, other: &Position) -> f64 {
        geo::haversine_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// This fix shifted by a local east/north offset in meters.
    /// Accuracy is carried over.
    pub fn offset_by(&self, east_m: f64, north_m: f64) -> Position {
        let (latitude, longitude) = geo::offset(self.latitude, self.longitude, east_m, north_m);
        Position {
            latitude,
            longitude,
            accuracy_m: self.accuracy_m,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Whether an accuracy circle should be drawn around this fix.
    pub fn shows_accuracy_circle(&self, max_radius_m: f64) -> bool {
        matches!(self.accuracy_m, Some(acc) if acc < max_radius_m)
    }
}

/// Stream of position updates. Dropping it cancels the watch.
pub type PositionStream = BoxStream<'static, Position>;

/// Platform location service.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// One-shot fix. Fails with `PermissionDenied` when access is not granted.
    async fn current_position(&self) -> Result<Position, PresenceError>;

    /// Continuous position updates.
    async fn watch_position(&self) -> Result<PositionStream, PresenceError>;
}

// ---------------------------------------------------------------------------
// Fixed
// ---------------------------------------------------------------------------

/// A provider that never moves, or that always refuses permission.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    position: Option<Position>,
}

impl FixedLocation {
    pub fn new(position: Position) -> Self {
        Self {
            position: Some(position),
        }
    }

    pub fn denied() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Position, PresenceError> {
        self.position.ok_or(PresenceError::PermissionDenied)
    }

    async fn watch_position(&self) -> Result<PositionStream, PresenceError> {
        match self.position {
            Some(_) => Ok(stream::pending().boxed()),
            None => Err(PresenceError::PermissionDenied),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated
// ---------------------------------------------------------------------------

/// Random walk around a starting point, one step per `step_interval`.
#[derive(Clone)]
pub struct SimulatedLocation {
    current: Arc<Mutex<Position>>,
    step_interval: Duration,
    max_step_m: f64,
    seed: Option<u64>,
}

impl SimulatedLocation {
    pub fn new(start: Position, step_interval: Duration, max_step_m: f64) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
            step_interval,
            max_step_m,
            seed: None,
        }
    }

    /// Make the walk reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn latest(&self) -> Position {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LocationProvider for SimulatedLocation {
    async fn current_position(&self) -> Result<Position, PresenceError> {
        Ok(self.latest())
    }

    async fn watch_position(&self) -> Result<PositionStream, PresenceError> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start = tokio::time::Instant::now() + self.step_interval;
        let ticker = tokio::time::interval_at(start, self.step_interval);
        let current = Arc::clone(&self.current);
        let max_step = self.max_step_m.max(0.0);

        let walk = stream::unfold((ticker, rng), move |(mut ticker, mut rng)| {
            let current = Arc::clone(&current);
            async move {
                ticker.tick().await;
                let east = rng.gen_range(-1.0..=1.0) * max_step;
                let north = rng.gen_range(-1.0..=1.0) * max_step;
                let next = {
                    let mut pos = current.lock().unwrap_or_else(|e| e.into_inner());
                    let (lat, lon) = geo::offset(pos.latitude, pos.longitude, east, north);
                    *pos = Position {
                        latitude: lat,
                        longitude: lon,
                        accuracy_m: Some(rng.gen_range(5.0..50.0)),
                    };
                    *pos
                };
                Some((next, (ticker, rng)))
            }
        });

        Ok(walk.boxed())
    }
}
