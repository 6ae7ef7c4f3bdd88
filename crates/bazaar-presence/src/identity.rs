use bazaar_common::UserId;
use serde::{Deserialize, Serialize};

/// The signed-in user whose presence is being reported.
#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: Option<String>,
    /// Contact address shown to peers (the auth email in the hosted app).
    pub contact: Option<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("contact", &self.contact.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            contact: None,
        }
    }

    /// A throwaway identity with a fresh id, used by simulations.
    pub fn generate(display_name: &str) -> Self {
        Self::new(UserId::generate()).with_display_name(display_name)
    }

    /// Set the display name. Blank names are treated as absent.
    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = non_blank(name);
        self
    }

    /// Set the contact address. Blank values are treated as absent.
    pub fn with_contact(mut self, contact: &str) -> Self {
        self.contact = non_blank(contact);
        self
    }

    /// Best human-readable label: display name, then contact, then id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.contact.as_deref())
            .unwrap_or_else(|| self.user_id.as_str())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
