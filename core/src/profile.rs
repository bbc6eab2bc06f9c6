//! Backend Profiles
//!
//! A profile is the backend-held account record linked to a member by
//! contact address. Profiles are created during account provisioning
//! and are read-only to this application.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, backend-assigned profile identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Wrap a raw backend identifier.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh identifier. Only the backend assigns real
    /// ones; this is for tests and synthetic data.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The raw identifier.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One backend account record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend-assigned identifier.
    pub id: ProfileId,
    /// Contact address.
    pub email: String,
    /// Stored display name, when the account has one.
    pub display_name: Option<String>,
}

impl Profile {
    /// The name to show for this profile: the stored display name, or
    /// the address local part when none is set.
    pub fn display_label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    /// The username this profile maps to (address local part).
    pub fn username(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_prefers_display_name() {
        let p = Profile {
            id: ProfileId::random(),
            email: "ana@famstar.local".into(),
            display_name: Some("Ana".into()),
        };
        assert_eq!(p.display_label(), "Ana");
    }

    #[test]
    fn test_display_label_falls_back_to_local_part() {
        let p = Profile {
            id: ProfileId::random(),
            email: "bruno@famstar.local".into(),
            display_name: None,
        };
        assert_eq!(p.display_label(), "bruno");
        assert_eq!(p.username(), "bruno");
    }

    #[test]
    fn test_empty_display_name_ignored() {
        let p = Profile {
            id: ProfileId::random(),
            email: "luz@famstar.local".into(),
            display_name: Some(String::new()),
        };
        assert_eq!(p.display_label(), "luz");
    }
}
