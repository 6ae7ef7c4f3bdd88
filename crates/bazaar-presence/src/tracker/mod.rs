//! Nearby-presence tracking.
//!
//! A `PresenceTracker` owns one reporting session: it pushes the device's
//! position to the shared registry on a fixed heartbeat and whenever the
//! device moves, and it derives the list of online peers from the
//! registry's live feed using a read-side staleness window. Everything is
//! best-effort: failed writes are logged and dropped.

mod feed;
mod reporter;
mod session;
mod types;


pub use feed::PeerSubscription;
pub use session::PresenceTracker;
pub use types::{TrackerConfig, TrackerState, HEARTBEAT_INTERVAL, MIN_MOVE_METERS, ONLINE_WINDOW};
