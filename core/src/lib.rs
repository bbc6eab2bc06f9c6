//! Famstar Core - Headless Application Core for the Family Voting App
//!
//! This crate provides the full application logic for famstar,
//! completely independent of any UI framework. It can drive a TUI, a
//! web surface, or run headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       UI Surfaces                          │
//! │        ┌─────────┐   ┌──────────┐   ┌───────────┐          │
//! │        │   TUI   │   │ Headless │   │  (future) │          │
//! │        │(ratatui)│   │  tests   │   │           │          │
//! │        └────┬────┘   └────┬─────┘   └─────┬─────┘          │
//! │             └─────────────┴───────────────┘                │
//! │                        │                                   │
//! │                  UiEvent (up)                              │
//! │                AppMessage (down)                           │
//! │                        │                                   │
//! └────────────────────────┼───────────────────────────────────┘
//!                          │
//! ┌────────────────────────┼───────────────────────────────────┐
//! │                    FAMSTAR CORE                             │
//! │  ┌─────────────────────┴─────────────────────────────────┐ │
//! │  │                    Controller                          │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────────┐ │ │
//! │  │  │ Session │ │ Ranking │ │ Feedback │ │   Backend   │ │ │
//! │  │  │         │ │ Engine  │ │ Profiles │ │ (vote store)│ │ │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └─────────────┘ │ │
//! │  └───────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Controller`]: owns all application state and drives every flow
//! - [`UiEvent`]: events sent from a UI surface to the controller
//! - [`AppMessage`]: declarative render directives sent back to the surface
//! - [`VoteBackend`]: the boundary trait for the managed backend service
//! - [`compute_ranking`]: the pure ranking aggregation
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any
//! other UI framework. It's pure application logic that can be used
//! anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod feedback;
pub mod members;
pub mod messages;
pub mod particles;
pub mod profile;
pub mod ranking;
pub mod screen;
pub mod session;
pub mod votes;

// Re-exports for convenience
pub use backend::{
    AdminBackend, AdminUser, CreateUser, SupabaseAdmin, SupabaseBackend, VoteBackend,
    VoteSubscription,
};
pub use config::{default_config_path, load_config, AppConfig, BackendSettings, ConfigError};
pub use controller::Controller;
pub use error::CoreError;
pub use events::UiEvent;
pub use feedback::{rain_for_position, FeedbackProfile, Note, RainSpec, RainTheme, ToneSpec, Waveform};
pub use members::{Member, MemberDirectory};
pub use messages::{AppMessage, InlineKind};
pub use particles::{Particle, ParticleRain};
pub use profile::{Profile, ProfileId};
pub use ranking::{compute_ranking, ranking_position, RankPosition, RankingEntry};
pub use screen::{
    Badge, ButtonStyle, HomeView, MemberTile, ModalButton, ModalCommand, ModalSpec, RankingRow,
    RecentVoteRow, Screen, ToastSpec,
};
pub use session::{AuthSession, Session};
pub use votes::{NewVote, Rating, RecentVote, VoteInsert, VoteRow};
