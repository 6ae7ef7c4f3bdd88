//! Nearby presence for UniBazaar.
//!
//! A [`PresenceTracker`] owns one user's session: it reads the device
//! location, writes a [`PresenceRecord`] to a shared [`PresenceStore`] every
//! heartbeat and on significant moves, and turns registry snapshots into a
//! [`PeerView`] of users seen within the online window.

pub mod clock;
pub mod geo;
pub mod identity;
pub mod location;
pub mod peers;
pub mod record;
pub mod store;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::Identity;
pub use location::{FixedLocation, LocationProvider, Position, PositionStream, SimulatedLocation};
pub use peers::{is_online, Peer, PeerView};
pub use record::PresenceRecord;
pub use store::{MemoryPresenceStore, PresenceStore, SnapshotStream};
pub use tracker::{
    PeerSubscription, PresenceTracker, TrackerConfig, TrackerState, HEARTBEAT_INTERVAL,
    MIN_MOVE_METERS, ONLINE_WINDOW,
};
