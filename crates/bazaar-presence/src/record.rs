//! The persisted presence document.

use bazaar_common::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::location::Position;

/// One user's last self-reported location, keyed by `user_id`.
///
/// Field names on the wire follow the hosted `presence` collection:
/// `uid`, `displayName`, `email`, `lat`, `lon`, `lastActive` (epoch ms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    #[serde(rename = "uid")]
    pub user_id: UserId,
    #[serde(rename = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "email", default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(rename = "lastActive", with = "chrono::serde::ts_milliseconds")]
    pub last_active_at: DateTime<Utc>,
}

impl PresenceRecord {
    /// Build the record a heartbeat writes for `identity` at `position`.
    pub fn report(identity: &Identity, position: &Position, at: DateTime<Utc>) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            contact: identity.contact.clone(),
            latitude: position.latitude,
            longitude: position.longitude,
            last_active_at: at,
        }
    }

    /// Apply a newer write for the same user.
    ///
    /// Position and timestamp always take the incoming values. The label
    /// fields only change when the incoming write carries them.
    pub fn merge(&mut self, incoming: PresenceRecord) {
        debug_assert_eq!(self.user_id, incoming.user_id);
        self.latitude = incoming.latitude;
        self.longitude = incoming.longitude;
        self.last_active_at = incoming.last_active_at;
        if incoming.display_name.is_some() {
            self.display_name = incoming.display_name;
        }
        if incoming.contact.is_some() {
            self.contact = incoming.contact;
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    /// Records with non-finite coordinates cannot be placed on a map.
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Label shown on the peer's marker.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.contact.as_deref())
            .unwrap_or_else(|| self.user_id.as_str())
    }
}
