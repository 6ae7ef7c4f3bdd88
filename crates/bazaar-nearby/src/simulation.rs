//! A local nearby-presence session: one shared in-memory registry, a
//! tracker for the local user, simulated peers walking around it, and a
//! few stale records left behind by users who went away.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use bazaar_common::PresenceError;
use bazaar_presence::{
    Clock, Identity, LocationProvider, MemoryPresenceStore, PeerSubscription, PeerView, Position,
    PresenceRecord, PresenceStore, PresenceTracker, SimulatedLocation, TrackerConfig,
};
use chrono::TimeDelta;
use tracing::{info, warn};

/// How often a simulated device takes a step.
const STEP_INTERVAL: Duration = Duration::from_secs(10);
/// Largest east or north component of one step.
const MAX_STEP_M: f64 = 25.0;
/// Radius of the ring peers start on.
const SCATTER_M: f64 = 400.0;

/// What to simulate.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub center: Position,
    pub peers: usize,
    pub stale: usize,
    pub tracker: TrackerConfig,
    /// Seed for the random walks. Unseeded walks differ on every run.
    pub seed: Option<u64>,
}

pub struct Simulation {
    store: MemoryPresenceStore,
    me: PresenceTracker,
    peers: Vec<PresenceTracker>,
}

impl Simulation {
    /// Seed stale records, then start every peer and finally the local
    /// tracker. Any tracker that fails to start aborts the whole run.
    pub async fn start(
        identity: Identity,
        plan: &SimulationPlan,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PresenceError> {
        let store = MemoryPresenceStore::new();
        seed_stale(&store, plan, clock.as_ref()).await;

        let mut peers = Vec::with_capacity(plan.peers);
        for i in 0..plan.peers {
            let start = scatter(&plan.center, i, plan.peers);
            let location = walker(start, plan.seed.map(|s| s.wrapping_add(i as u64 + 1)));
            let tracker = PresenceTracker::with_clock(
                Identity::generate(&format!("Peer {}", i + 1)),
                location,
                Arc::new(store.clone()),
                Arc::clone(&clock),
                plan.tracker.clone(),
            );
            tracker.start_tracking().await?;
            peers.push(tracker);
        }

        let me = PresenceTracker::with_clock(
            identity,
            walker(plan.center, plan.seed),
            Arc::new(store.clone()),
            clock,
            plan.tracker.clone(),
        );
        me.start_tracking().await?;

        info!(
            user = me.identity().label(),
            peers = plan.peers,
            stale = plan.stale,
            "Simulation started"
        );
        Ok(Self { store, me, peers })
    }

    /// Watch the peers the local user can see.
    pub fn watch<F>(&self, on_update: F) -> PeerSubscription
    where
        F: FnMut(PeerView) + Send + 'static,
    {
        self.me.subscribe_to_peers_with_errors(on_update, |e| {
            warn!(error = %e, "Peer feed ended");
        })
    }

    /// Stop every tracker. Records stay in the registry and age out.
    pub fn stop(&self) {
        self.me.stop_tracking();
        for peer in &self.peers {
            peer.stop_tracking();
        }
    }

    pub fn me(&self) -> &PresenceTracker {
        &self.me
    }

    pub fn peers(&self) -> &[PresenceTracker] {
        &self.peers
    }

    pub fn store(&self) -> &MemoryPresenceStore {
        &self.store
    }
}

/// One-line summary of a peer view for the log.
///
/// The local fix's accuracy is included when it is tight enough that the
/// map would draw an accuracy circle for it.
pub fn describe(view: &PeerView, accuracy_circle_max_m: f64) -> String {
    let mut line = if view.is_empty() {
        "nobody nearby".to_string()
    } else {
        let nearest: Vec<String> = view
            .peers()
            .iter()
            .take(3)
            .map(|p| match p.distance_m {
                Some(d) => format!("{} ({:.0} m)", p.record.label(), d),
                None => p.record.label().to_string(),
            })
            .collect();
        format!("{} online, nearest: {}", view.len(), nearest.join(", "))
    };

    let accuracy = view
        .origin()
        .filter(|fix| fix.shows_accuracy_circle(accuracy_circle_max_m))
        .and_then(|fix| fix.accuracy_m);
    if let Some(acc) = accuracy {
        line.push_str(&format!(" [you: ±{acc:.0} m]"));
    }
    line
}

fn walker(start: Position, seed: Option<u64>) -> Arc<dyn LocationProvider> {
    let walk = SimulatedLocation::new(start, STEP_INTERVAL, MAX_STEP_M);
    match seed {
        Some(seed) => Arc::new(walk.with_seed(seed)),
        None => Arc::new(walk),
    }
}

/// Evenly spaced point `i` of `n` on a ring around `center`.
fn scatter(center: &Position, i: usize, n: usize) -> Position {
    let angle = TAU * i as f64 / n.max(1) as f64;
    center.offset_by(SCATTER_M * angle.cos(), SCATTER_M * angle.sin())
}

/// Write records whose last report is already outside the online window.
async fn seed_stale(store: &MemoryPresenceStore, plan: &SimulationPlan, clock: &dyn Clock) {
    let window = TimeDelta::seconds(plan.tracker.online_window.as_secs() as i64);
    let now = clock.now();
    for i in 0..plan.stale {
        let identity = Identity::generate(&format!("Away {}", i + 1));
        let at = now - window - TimeDelta::minutes(i as i64 + 1);
        let position = scatter(&plan.center, i, plan.stale).offset_by(0.0, SCATTER_M / 2.0);
        let record = PresenceRecord::report(&identity, &position, at);
        if let Err(e) = store.put(record).await {
            warn!(user_id = %identity.user_id, error = %e, "Failed to seed stale record");
        }
    }
}
