//! The owned tracking session and the state its background tasks share.

use std::sync::{Arc, Mutex, MutexGuard};

use bazaar_common::PresenceError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::identity::Identity;
use crate::location::{LocationProvider, Position};
use crate::peers::PeerView;
use crate::record::PresenceRecord;
use crate::store::PresenceStore;

use super::feed::{spawn_peer_feed, PeerSubscription};
use super::reporter::run_reporter;
use super::types::{TrackerConfig, TrackerState};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Session {
    state: TrackerState,
    /// Bumped on every start and stop. A write only goes out if the
    /// generation it was scheduled under is still current.
    generation: u64,
    cancel: CancellationToken,
    reporter: Option<JoinHandle<()>>,
}

pub(crate) struct Shared {
    pub(crate) identity: Identity,
    pub(crate) location: Arc<dyn LocationProvider>,
    pub(crate) store: Arc<dyn PresenceStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: TrackerConfig,
    session: Mutex<Session>,
    last_position: Mutex<Option<Position>>,
}

impl Shared {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let session = self.lock_session();
        session.generation == generation && session.state != TrackerState::Stopped
    }

    pub(crate) fn last_position(&self) -> Option<Position> {
        *self.last_position.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_last_position(&self, position: Position) {
        *self.last_position.lock().unwrap_or_else(|e| e.into_inner()) = Some(position);
    }

    /// Write this user's record. Failures are logged and dropped.
    pub(crate) async fn report(&self, generation: u64, position: Position) {
        if !self.is_current(generation) {
            debug!(user_id = %self.identity.user_id, "Skipping presence write for a stopped session");
            return;
        }

        let record = PresenceRecord::report(&self.identity, &position, self.clock.now());
        match self.store.put(record).await {
            Ok(()) => debug!(
                user_id = %self.identity.user_id,
                lat = position.latitude,
                lon = position.longitude,
                "Presence reported"
            ),
            Err(e) => warn!(
                user_id = %self.identity.user_id,
                error = %e,
                "Presence write dropped"
            ),
        }
    }

    pub(crate) fn peer_view(&self, records: &[PresenceRecord]) -> PeerView {
        PeerView::compute(
            records,
            &self.identity.user_id,
            self.clock.now(),
            self.config.online_window,
            self.last_position().as_ref(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// One user's presence session.
///
/// Owns its heartbeat task and cancellation token, so several trackers can
/// run side by side and each is torn down deterministically by
/// `stop_tracking` or by being dropped. Background tasks are spawned on the
/// ambient Tokio runtime.
pub struct PresenceTracker {
    shared: Arc<Shared>,
}

impl PresenceTracker {
    pub fn new(
        identity: Identity,
        location: Arc<dyn LocationProvider>,
        store: Arc<dyn PresenceStore>,
        config: TrackerConfig,
    ) -> Self {
        Self::with_clock(identity, location, store, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        identity: Identity,
        location: Arc<dyn LocationProvider>,
        store: Arc<dyn PresenceStore>,
        clock: Arc<dyn Clock>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                identity,
                location,
                store,
                clock,
                config,
                session: Mutex::new(Session {
                    state: TrackerState::Stopped,
                    generation: 0,
                    cancel: CancellationToken::new(),
                    reporter: None,
                }),
                last_position: Mutex::new(None),
            }),
        }
    }

    /// Acquire a first fix, report it, then keep reporting on the heartbeat
    /// and on significant moves.
    ///
    /// Returns `PermissionDenied` (or `LocationUnavailable`) without
    /// scheduling anything when no fix can be had, and `Cancelled` if
    /// `stop_tracking` ran while the fix was pending. A failed first write
    /// does not fail the start.
    pub async fn start_tracking(&self) -> Result<(), PresenceError> {
        let shared = &self.shared;
        let (generation, cancel) = {
            let mut session = shared.lock_session();
            if session.state != TrackerState::Stopped {
                return Err(PresenceError::AlreadyStarted);
            }
            session.state = TrackerState::Starting;
            session.generation += 1;
            session.cancel = CancellationToken::new();
            (session.generation, session.cancel.clone())
        };
        info!(user_id = %shared.identity.user_id, "Starting presence tracking");

        let first = match shared.location.current_position().await {
            Ok(position) => position,
            Err(e) => {
                {
                    let mut session = shared.lock_session();
                    if session.generation == generation {
                        session.state = TrackerState::Stopped;
                    }
                }
                warn!(user_id = %shared.identity.user_id, error = %e, "No location fix, presence stays off");
                return Err(e);
            }
        };
        if !shared.is_current(generation) {
            return Err(PresenceError::Cancelled);
        }

        shared.set_last_position(first);
        shared.report(generation, first).await;

        let positions = match shared.location.watch_position().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "Position watch unavailable, reporting on heartbeat only");
                None
            }
        };

        let mut session = shared.lock_session();
        if session.generation != generation || session.state == TrackerState::Stopped {
            return Err(PresenceError::Cancelled);
        }
        session.state = TrackerState::Active;
        session.reporter = Some(tokio::spawn(run_reporter(
            Arc::clone(shared),
            generation,
            cancel,
            positions,
            first,
        )));
        info!(
            user_id = %shared.identity.user_id,
            heartbeat_secs = shared.config.heartbeat_interval.as_secs(),
            "Presence tracking active"
        );
        Ok(())
    }

    /// Stop reporting. No write is issued after this returns; one already
    /// awaiting the store may still land. Idempotent.
    pub fn stop_tracking(&self) {
        let reporter = {
            let mut session = self.shared.lock_session();
            if session.state == TrackerState::Stopped {
                return;
            }
            session.state = TrackerState::Stopped;
            session.generation += 1;
            session.cancel.cancel();
            session.reporter.take()
        };
        if let Some(handle) = reporter {
            handle.abort();
        }
        info!(user_id = %self.shared.identity.user_id, "Presence tracking stopped");
    }

    /// Watch the registry and call `on_update` with the online peers after
    /// every change. Feed errors are logged.
    pub fn subscribe_to_peers<F>(&self, on_update: F) -> PeerSubscription
    where
        F: FnMut(PeerView) + Send + 'static,
    {
        spawn_peer_feed(Arc::clone(&self.shared), Box::new(on_update), None)
    }

    /// Like `subscribe_to_peers`, but feed errors go to `on_error`.
    pub fn subscribe_to_peers_with_errors<F, E>(&self, on_update: F, on_error: E) -> PeerSubscription
    where
        F: FnMut(PeerView) + Send + 'static,
        E: FnMut(PresenceError) + Send + 'static,
    {
        spawn_peer_feed(
            Arc::clone(&self.shared),
            Box::new(on_update),
            Some(Box::new(on_error)),
        )
    }

    pub fn state(&self) -> TrackerState {
        self.shared.lock_session().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == TrackerState::Active
    }

    /// Most recent fix seen by this session, reported or not.
    pub fn last_position(&self) -> Option<Position> {
        self.shared.last_position()
    }

    pub fn identity(&self) -> &Identity {
        &self.shared.identity
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}
