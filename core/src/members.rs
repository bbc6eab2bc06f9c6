//! Member Directory
//!
//! The static mapping of known participants. Members are defined at
//! deploy time in the configuration file and never change while the
//! app is running; every other component takes this directory as
//! input.

use serde::{Deserialize, Serialize};

/// One deploy-time-configured participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique, stable key. Matches the local part of the contact
    /// address for provisioned accounts.
    pub username: String,
    /// Human-readable display name.
    pub name: String,
    /// Icon asset reference (small picture shown in lists).
    pub icon: String,
    /// Avatar asset reference (large picture shown on the home view).
    pub avatar: String,
    /// Contact address linking this member to a backend profile.
    pub email: String,
}

impl Member {
    /// Whether this member is still on a placeholder provisioning
    /// address and cannot receive password-reset mail.
    pub fn has_placeholder_email(&self) -> bool {
        self.email.ends_with(".local")
    }
}

/// Immutable lookup table over the configured members.
#[derive(Clone, Debug, Default)]
pub struct MemberDirectory {
    members: Vec<Member>,
}

impl MemberDirectory {
    /// Build a directory from the configured roster.
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// All members, in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Number of configured members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Look up a member by username.
    pub fn by_username(&self, username: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.username == username)
    }

    /// Look up a member by contact address.
    pub fn by_email(&self, email: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.email == email)
    }

    /// Resolve the member behind an authenticated profile. Falls back
    /// to matching the username against the address local part, the
    /// way provisioned accounts are named.
    pub fn for_account(&self, email: &str) -> Option<&Member> {
        self.by_email(email)
            .or_else(|| email.split('@').next().and_then(|u| self.by_username(u)))
    }

    /// Everyone except the given username: the vote-target list.
    pub fn others(&self, username: &str) -> Vec<&Member> {
        self.members
            .iter()
            .filter(|m| m.username != username)
            .collect()
    }
}
