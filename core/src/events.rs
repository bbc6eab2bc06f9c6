//! Surface Events
//!
//! Events sent from a UI surface to the controller. Surfaces are
//! "dumb" renderers: they report what the user did and render what
//! they are told; the controller decides what each action means.

use serde::{Deserialize, Serialize};

use crate::screen::ModalCommand;

/// Events from a UI surface to the controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiEvent {
    /// Surface is up; show the entry screen.
    Start,

    // ============================================
    // Authentication
    // ============================================
    /// Leave the welcome screen for the user picker.
    GoToLogin,
    /// Back out of the picker to the welcome screen.
    GoToWelcome,
    /// A member icon was picked.
    SelectMember {
        /// Username of the picked member.
        username: String,
    },
    /// Back out of password entry to the picker.
    BackToMembers,
    /// Password entry was submitted.
    SubmitPassword {
        /// The entered password.
        password: String,
    },
    /// Open the password-reset view for the picked member.
    ForgotPassword,
    /// Request the password-reset mail.
    SendPasswordReset,
    /// Back out of the reset view to password entry.
    BackToPassword,
    /// The change-password form was submitted.
    SubmitNewPassword {
        /// New password.
        password: String,
        /// Confirmation entry.
        confirm: String,
    },
    /// Abandon the forced password change and sign out.
    CancelPasswordChange,

    // ============================================
    // Navigation
    // ============================================
    /// Return to the home screen.
    GoHome,
    /// Open the vote-target list.
    GoToVote,
    /// Open the ranking.
    GoToRanking,
    /// Open the recent-votes listing.
    GoToRecentVotes,

    // ============================================
    // Voting
    // ============================================
    /// A vote target was picked.
    SelectTarget {
        /// Username of the picked target.
        username: String,
    },
    /// Back out of star entry to the target list.
    BackToTargets,
    /// A star value was picked (may change repeatedly before confirm).
    SelectRating {
        /// Raw star value, validated by the controller.
        rating: u8,
    },
    /// Submit the pending target/rating pair.
    ConfirmVote,

    // ============================================
    // Session & modals
    // ============================================
    /// Ask to log out (opens the confirmation modal).
    RequestLogout,
    /// A modal action was activated.
    ModalAction(ModalCommand),
}

impl UiEvent {
    /// Whether handling this event may call the backend. Surfaces use
    /// this to paint the blocking loading indicator before handing the
    /// event over.
    pub fn needs_backend(&self) -> bool {
        matches!(
            self,
            UiEvent::SubmitPassword { .. }
                | UiEvent::SendPasswordReset
                | UiEvent::SubmitNewPassword { .. }
                | UiEvent::CancelPasswordChange
                | UiEvent::ConfirmVote
                | UiEvent::GoToRanking
                | UiEvent::GoToRecentVotes
                | UiEvent::ModalAction(ModalCommand::ConfirmLogout)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_events_do_not_need_backend() {
        assert!(!UiEvent::Start.needs_backend());
        assert!(!UiEvent::GoHome.needs_backend());
        assert!(!UiEvent::SelectRating { rating: 3 }.needs_backend());
        assert!(!UiEvent::ModalAction(ModalCommand::Dismiss).needs_backend());
    }

    #[test]
    fn test_backend_events_flagged() {
        assert!(UiEvent::SubmitPassword {
            password: "x".into()
        }
        .needs_backend());
        assert!(UiEvent::ConfirmVote.needs_backend());
        assert!(UiEvent::GoToRanking.needs_backend());
        assert!(UiEvent::ModalAction(ModalCommand::ConfirmLogout).needs_backend());
    }
}
