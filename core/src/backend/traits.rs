//! Backend Traits
//!
//! Trait definitions for the managed backend service. The abstraction
//! keeps the controller testable against an in-memory mock and keeps
//! every service-specific detail (endpoints, auth headers, wire
//! formats) inside one implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::profile::{Profile, ProfileId};
use crate::session::AuthSession;
use crate::votes::{NewVote, RecentVote, VoteInsert, VoteRow};

/// A standing subscription to rating-event inserts for one target.
///
/// Inserted rows are forwarded into an internal channel in arrival
/// order; the owner drains them with [`try_recv`](Self::try_recv) from
/// its single-threaded loop. Dropping the subscription (or calling
/// [`unsubscribe`](Self::unsubscribe)) closes the channel and aborts
/// the forwarding task, so no handler can fire from a stale
/// subscription.
#[derive(Debug)]
pub struct VoteSubscription {
    rx: mpsc::Receiver<VoteInsert>,
    _guard: Option<SubscriptionGuard>,
}

impl VoteSubscription {
    /// A subscription fed directly through a channel (tests, in-memory
    /// backends).
    pub fn new(rx: mpsc::Receiver<VoteInsert>) -> Self {
        Self { rx, _guard: None }
    }

    /// A subscription backed by a forwarding task that must be aborted
    /// on teardown.
    pub fn with_guard(rx: mpsc::Receiver<VoteInsert>, guard: SubscriptionGuard) -> Self {
        Self {
            rx,
            _guard: Some(guard),
        }
    }

    /// The next pending event, if any. Never blocks.
    pub fn try_recv(&mut self) -> Option<VoteInsert> {
        self.rx.try_recv().ok()
    }

    /// Tear the subscription down.
    pub fn unsubscribe(self) {
        // Dropping rx closes the channel; dropping the guard aborts
        // the forwarding task.
    }
}

/// Aborts the forwarding task when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: tokio::task::JoinHandle<()>,
}

impl SubscriptionGuard {
    /// Guard the given forwarding task.
    pub fn new(handle: tokio::task::JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The backend service boundary used by the end-user client.
#[async_trait]
pub trait VoteBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    // ============================================
    // Auth
    // ============================================
    /// Check credentials and open an authenticated session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, CoreError>;

    /// Close the authenticated session.
    async fn sign_out(&self) -> Result<(), CoreError>;

    /// Set a new password for the signed-in account and clear its
    /// must-change flag.
    async fn update_password(&self, new_password: &str) -> Result<(), CoreError>;

    /// Ask the service to send a password-reset mail.
    async fn request_password_reset(&self, email: &str) -> Result<(), CoreError>;

    // ============================================
    // Profile store
    // ============================================
    /// One profile by identifier.
    async fn profile_by_id(&self, id: ProfileId) -> Result<Option<Profile>, CoreError>;

    /// One profile by contact address.
    async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>, CoreError>;

    /// All profiles.
    async fn list_profiles(&self) -> Result<Vec<Profile>, CoreError>;

    // ============================================
    // Rating store
    // ============================================
    /// Append one rating event.
    async fn insert_vote(&self, vote: &NewVote) -> Result<(), CoreError>;

    /// The full, unfiltered event listing.
    async fn list_votes(&self) -> Result<Vec<VoteRow>, CoreError>;

    /// The most recent events joined with both display names, newest
    /// first.
    async fn recent_votes(&self, limit: usize) -> Result<Vec<RecentVote>, CoreError>;

    // ============================================
    // Realtime channel
    // ============================================
    /// Subscribe to inserts targeting the given profile.
    async fn subscribe_votes(&self, target: ProfileId) -> Result<VoteSubscription, CoreError>;
}

/// One account row as seen through the privileged management API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminUser {
    /// Backend-assigned account id.
    pub id: String,
    /// Contact address.
    pub email: String,
}

/// A bulk-provisioning request for one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateUser {
    /// Contact address.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Display name stored in the account metadata.
    pub display_name: String,
    /// Whether the account must change its password on first login.
    pub must_change_password: bool,
}

/// The privileged management API, used only by offline operator
/// tooling. Requires the service-role key, never the anon key.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// All accounts.
    async fn list_users(&self) -> Result<Vec<AdminUser>, CoreError>;

    /// Provision one account.
    async fn create_user(&self, request: &CreateUser) -> Result<AdminUser, CoreError>;

    /// Overwrite an account's password.
    async fn set_password(&self, user_id: &str, new_password: &str) -> Result<(), CoreError>;

    /// Change an account's contact address.
    async fn set_email(&self, user_id: &str, new_email: &str) -> Result<(), CoreError>;
}
