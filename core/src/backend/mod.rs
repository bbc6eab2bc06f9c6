//! Backend Boundary
//!
//! Everything behind this module is owned by the managed backend
//! service: credential checking, profile storage, the append-only vote
//! store, and realtime insert delivery. The app talks to it through
//! the [`VoteBackend`] trait; [`SupabaseBackend`] is the thin client
//! over the service's HTTP surface. The privileged [`AdminBackend`]
//! operations are used only by the offline operator CLI.

mod realtime;
mod supabase;
mod traits;

pub use supabase::{SupabaseAdmin, SupabaseBackend};
pub use traits::{
    AdminBackend, AdminUser, CreateUser, SubscriptionGuard, VoteBackend, VoteSubscription,
};
