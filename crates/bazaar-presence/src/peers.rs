//! Derived view of other users currently considered online.

use std::cmp::Ordering;
use std::time::Duration;

use bazaar_common::UserId;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::location::Position;
use crate::record::PresenceRecord;

/// Whether `record` was reported strictly less than `window` before `now`.
///
/// Records stamped in the future (clock skew between devices) count as online.
pub fn is_online(record: &PresenceRecord, now: DateTime<Utc>, window: Duration) -> bool {
    let age_ms = now.timestamp_millis() - record.last_active_at.timestamp_millis();
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    age_ms < window_ms
}

/// One online peer.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub record: PresenceRecord,
    /// Distance from the local user's last known position, if any.
    pub distance_m: Option<f64>,
}

impl Peer {
    pub fn user_id(&self) -> &UserId {
        &self.record.user_id
    }
}

/// The filtered, non-persisted set of online peers.
///
/// Nearest first when the local position is known, otherwise ordered by
/// user id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerView {
    peers: Vec<Peer>,
    origin: Option<Position>,
}

impl PeerView {
    /// Filter a registry snapshot down to online peers, excluding `self_id`.
    pub fn compute(
        records: &[PresenceRecord],
        self_id: &UserId,
        now: DateTime<Utc>,
        window: Duration,
        origin: Option<&Position>,
    ) -> Self {
        let mut peers: Vec<Peer> = records
            .iter()
            .filter(|r| &r.user_id != self_id)
            .filter(|r| {
                let ok = r.is_well_formed();
                if !ok {
                    debug!(user_id = %r.user_id, "Skipping presence record with bad coordinates");
                }
                ok
            })
            .filter(|r| is_online(r, now, window))
            .map(|r| Peer {
                distance_m: origin.map(|o| o.distance_m(&r.position())),
                record: r.clone(),
            })
            .collect();

        peers.sort_by(|a, b| {
            let by_distance = match (a.distance_m, b.distance_m) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            };
            by_distance.then_with(|| a.record.user_id.cmp(&b.record.user_id))
        });

        Self {
            peers,
            origin: origin.copied(),
        }
    }

    /// The local fix distances were measured from, if one was known.
    pub fn origin(&self) -> Option<&Position> {
        self.origin.as_ref()
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.peers.iter().any(|p| p.user_id() == user_id)
    }

    pub fn user_ids(&self) -> Vec<&UserId> {
        self.peers.iter().map(Peer::user_id).collect()
    }

    pub fn nearest(&self) -> Option<&Peer> {
        self.peers.iter().find(|p| p.distance_m.is_some())
    }

    /// Peers within `radius_m` of the local user. Peers without a known
    /// distance are left out.
    pub fn within(&self, radius_m: f64) -> impl Iterator<Item = &Peer> {
        self.peers
            .iter()
            .filter(move |p| matches!(p.distance_m, Some(d) if d <= radius_m))
    }
}

impl IntoIterator for PeerView {
    type Item = Peer;
    type IntoIter = std::vec::IntoIter<Peer>;

    fn into_iter(self) -> Self::IntoIter {
        self.peers.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const WINDOW: Duration = Duration::from_secs(5 * 60);

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn record(id: &str, lat: f64, lon: f64, at: DateTime<Utc>) -> PresenceRecord {
        PresenceRecord {
            user_id: UserId::from(id),
            display_name: None,
            contact: None,
            latitude: lat,
            longitude: lon,
            last_active_at: at,
        }
    }

    #[test]
    fn staleness_boundary_is_strict() {
        let window = TimeDelta::minutes(5);
        let eps = TimeDelta::milliseconds(1);
        let records = vec![
            record("just-stale", 0.0, 0.0, now() - window - eps),
            record("just-fresh", 0.0, 0.0, now() - window + eps),
            record("exactly", 0.0, 0.0, now() - window),
        ];

        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, None);
        assert_eq!(view.user_ids(), vec![&UserId::from("just-fresh")]);
    }

    #[test]
    fn self_is_always_excluded() {
        let records = vec![
            record("me", 0.0, 0.0, now()),
            record("other", 0.0, 0.0, now()),
        ];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, None);
        assert!(!view.contains(&UserId::from("me")));
        assert!(view.contains(&UserId::from("other")));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn stale_self_is_excluded_too() {
        let records = vec![record("me", 0.0, 0.0, now() - TimeDelta::hours(2))];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, None);
        assert!(view.is_empty());
    }

    #[test]
    fn one_fresh_one_stale_peer() {
        let records = vec![
            record("A", 0.0, 0.0, now() - TimeDelta::minutes(1)),
            record("B", 0.0, 0.0, now() - TimeDelta::minutes(10)),
            record("C", 0.0, 0.0, now()),
        ];
        let view = PeerView::compute(&records, &UserId::from("C"), now(), WINDOW, None);
        assert_eq!(view.user_ids(), vec![&UserId::from("A")]);
    }

    #[test]
    fn future_timestamps_count_as_online() {
        let records = vec![record("skewed", 0.0, 0.0, now() + TimeDelta::minutes(3))];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, None);
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn empty_registry_gives_empty_view() {
        let view = PeerView::compute(&[], &UserId::from("me"), now(), WINDOW, None);
        assert!(view.is_empty());
        assert!(view.nearest().is_none());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let records = vec![
            record("nan", f64::NAN, 0.0, now()),
            record("ok", 1.0, 1.0, now()),
        ];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, None);
        assert_eq!(view.user_ids(), vec![&UserId::from("ok")]);
    }

    #[test]
    fn sorted_nearest_first_with_origin() {
        let origin = Position::new(49.2827, -123.1207);
        let records = vec![
            record("far", 49.30, -123.1207, now()),
            record("near", 49.2830, -123.1207, now()),
            record("mid", 49.29, -123.1207, now()),
        ];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, Some(&origin));

        let ids: Vec<&str> = view.user_ids().iter().map(|u| u.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        let nearest = view.nearest().unwrap();
        assert_eq!(nearest.user_id().as_str(), "near");
        assert!(nearest.distance_m.unwrap() < 50.0);
        assert_eq!(view.origin(), Some(&origin));
    }

    #[test]
    fn sorted_by_id_without_origin() {
        let records = vec![
            record("b", 0.0, 0.0, now()),
            record("a", 10.0, 10.0, now()),
        ];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, None);
        let ids: Vec<&str> = view.user_ids().iter().map(|u| u.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(view.peers().iter().all(|p| p.distance_m.is_none()));
        assert!(view.origin().is_none());
    }

    #[test]
    fn within_radius_filters_by_distance() {
        let origin = Position::new(0.0, 0.0);
        let records = vec![
            record("close", 0.001, 0.0, now()),
            record("away", 1.0, 0.0, now()),
        ];
        let view = PeerView::compute(&records, &UserId::from("me"), now(), WINDOW, Some(&origin));
        let close: Vec<&str> = view.within(1_000.0).map(|p| p.user_id().as_str()).collect();
        assert_eq!(close, vec!["close"]);
    }
}
