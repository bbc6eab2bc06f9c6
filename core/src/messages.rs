//! Application Messages
//!
//! Messages sent from the controller to a UI surface. Each one is a
//! declarative render directive: the surface applies it to its view
//! state and draws, with no business logic of its own. Results that
//! arrive for a screen that is no longer active are simply stored and
//! never rendered; nothing here can fail on a "missing element".

use serde::{Deserialize, Serialize};

use crate::feedback::{FeedbackProfile, RainSpec};
use crate::screen::{
    HomeView, MemberTile, ModalSpec, RankingRow, RecentVoteRow, Screen, ToastSpec,
};
use crate::votes::Rating;

/// Where inline text on a screen comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineKind {
    /// A validation or operation error.
    Error,
    /// A success/confirmation notice.
    Notice,
}

/// Messages from the controller to a UI surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AppMessage {
    // ============================================
    // Screen state
    // ============================================
    /// Switch the visible screen.
    Screen(Screen),
    /// Show inline text on a specific screen.
    Inline {
        /// The screen the text belongs to.
        screen: Screen,
        /// Error or notice.
        kind: InlineKind,
        /// The text itself.
        message: String,
    },
    /// Clear any inline text.
    ClearInline,
    /// After a delay, the surface should send the given event back
    /// (used for the timed return from the reset-confirmation view).
    ReturnLater {
        /// Delay before the return, in milliseconds.
        after_ms: u64,
    },

    // ============================================
    // View models
    // ============================================
    /// The member grid for the user picker.
    MemberList(Vec<MemberTile>),
    /// Who the password prompt is for.
    PasswordPrompt(MemberTile),
    /// Who the reset view is for.
    ForgotPrompt(MemberTile),
    /// The home screen content.
    HomeLoaded(HomeView),
    /// The vote-target list.
    VoteTargets(Vec<MemberTile>),
    /// Who the star entry is for.
    RatePrompt(MemberTile),
    /// The currently highlighted star value.
    RatingSelected(Rating),
    /// The computed ranking rows.
    RankingLoaded(Vec<RankingRow>),
    /// The recent-votes rows, newest first.
    RecentVotesLoaded(Vec<RecentVoteRow>),

    // ============================================
    // Overlays
    // ============================================
    /// Open a modal dialog.
    Modal(ModalSpec),
    /// Close the modal dialog.
    ModalClose,
    /// Show an ephemeral toast.
    Toast(ToastSpec),

    // ============================================
    // Feedback
    // ============================================
    /// Perform a rating's tone and haptic feedback.
    PlayFeedback(FeedbackProfile),
    /// Perform a bare haptic pattern.
    Haptic(Vec<u32>),
    /// Start a particle rain.
    RainStart(RainSpec),
    /// Cancel any running particle rain.
    RainStop,

    // ============================================
    // Session
    // ============================================
    /// The session ended; the surface should discard all per-session
    /// view state.
    SessionEnded,
}
