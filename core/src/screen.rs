//! Screens, Modals and View Models
//!
//! Exactly one screen is visible at a time; transitions are explicit
//! named events, never a back-stack pop. A modal overlay is orthogonal
//! to the screen state: it can sit over any screen and is dismissed
//! only by one of its labeled actions. Toasts are separate, ephemeral,
//! and self-dismiss on the surface after a fixed delay.
//!
//! The structs here are declarative view models: pure data describing
//! what a screen shows, produced by the controller and rendered by a
//! stable renderer on the surface.

use serde::{Deserialize, Serialize};

use crate::ranking::RankPosition;
use crate::votes::Rating;

/// Every full-screen view the app can show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    /// Entry view before any interaction.
    #[default]
    Welcome,
    /// User-icon grid for picking who is logging in.
    PickUser,
    /// Password entry for the picked user.
    Password,
    /// Password-reset request for the picked user.
    ForgotPassword,
    /// Forced or voluntary password change.
    ChangePassword,
    /// Authenticated landing view.
    Home,
    /// Target list for casting a vote.
    VoteTargets,
    /// Star-rating entry for the picked target.
    VoteRate,
    /// The computed ranking.
    Ranking,
    /// Most recent votes, newest first.
    RecentVotes,
}

impl Screen {
    /// Whether this screen requires an authenticated session.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Screen::Home
                | Screen::VoteTargets
                | Screen::VoteRate
                | Screen::Ranking
                | Screen::RecentVotes
        )
    }
}

/// One member cell in a picker grid or target list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTile {
    /// Stable key for selection events.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Icon asset reference.
    pub icon: String,
    /// Avatar asset reference.
    pub avatar: String,
}

/// Badge earned by a ranking position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    /// First place.
    Crown,
    /// Last place.
    Poop,
}

/// The home screen's view model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    /// Display name of the signed-in member.
    pub name: String,
    /// Avatar asset reference.
    pub avatar: String,
    /// Position badge, when first or last.
    pub badge: Option<Badge>,
    /// The position itself, when the event set was retrievable.
    pub rank: Option<RankPosition>,
}

/// One row of the rendered ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    /// 1-based position.
    pub position: usize,
    /// Display name.
    pub name: String,
    /// Icon asset reference.
    pub icon: String,
    /// Average rating; meaningless when `count` is 0.
    pub average: f64,
    /// Number of received votes.
    pub count: usize,
    /// Top of the table.
    pub is_first: bool,
    /// Bottom of the table.
    pub is_last: bool,
}

impl RankingRow {
    /// The score column text: "★ 4.2 (7 votes)", or a placeholder
    /// when no votes were received.
    pub fn score_label(&self) -> String {
        if self.count > 0 {
            format!("★ {:.1} ({} votes)", self.average, self.count)
        } else {
            "No votes yet".to_string()
        }
    }
}

/// One row of the recent-votes listing, ready to render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentVoteRow {
    /// Who voted.
    pub voter: String,
    /// Who was rated.
    pub voted_for: String,
    /// The star value.
    pub rating: Rating,
    /// Humanized age label.
    pub age: String,
}

/// Commands a modal action can issue back to the controller. Typed
/// rather than stringly so the surface cannot invent transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalCommand {
    /// Close the modal, nothing else.
    Dismiss,
    /// Close the modal and log out.
    ConfirmLogout,
    /// Close the vote-success modal: stop the rain, clear the pending
    /// selection, return home.
    AcknowledgeVote,
}

/// Visual weight of a modal button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonStyle {
    /// The emphasized default action.
    Primary,
    /// A de-emphasized alternative.
    Secondary,
}

/// One labeled modal action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalButton {
    /// Button label.
    pub label: String,
    /// What pressing it does.
    pub command: ModalCommand,
    /// Visual weight.
    pub style: ButtonStyle,
}

impl ModalButton {
    /// An emphasized action.
    pub fn primary(label: impl Into<String>, command: ModalCommand) -> Self {
        Self {
            label: label.into(),
            command,
            style: ButtonStyle::Primary,
        }
    }

    /// A de-emphasized action.
    pub fn secondary(label: impl Into<String>, command: ModalCommand) -> Self {
        Self {
            label: label.into(),
            command,
            style: ButtonStyle::Secondary,
        }
    }
}

/// A modal dialog: icon, title, message and its actions. No backdrop
/// dismissal and no timeout; only an action closes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSpec {
    /// Short icon token, e.g. "[!]".
    pub icon: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// The labeled actions, in display order.
    pub actions: Vec<ModalButton>,
}

impl ModalSpec {
    /// A single-button acknowledgement dialog.
    pub fn notice(
        icon: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            icon: icon.into(),
            title: title.into(),
            message: message.into(),
            actions: vec![ModalButton::primary("OK", ModalCommand::Dismiss)],
        }
    }
}

/// An ephemeral toast notification. The surface self-dismisses it
/// after a fixed delay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastSpec {
    /// Short icon token.
    pub icon: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_session() {
        assert!(Screen::Home.requires_session());
        assert!(Screen::Ranking.requires_session());
        assert!(!Screen::Welcome.requires_session());
        assert!(!Screen::Password.requires_session());
    }

    #[test]
    fn test_score_label() {
        let mut row = RankingRow {
            position: 1,
            name: "Ana".into(),
            icon: "ana.png".into(),
            average: 4.25,
            count: 8,
            is_first: true,
            is_last: false,
        };
        assert_eq!(row.score_label(), "★ 4.2 (8 votes)");

        row.count = 0;
        assert_eq!(row.score_label(), "No votes yet");
    }

    #[test]
    fn test_notice_modal_has_single_dismiss() {
        let modal = ModalSpec::notice("[!]", "ERROR", "Something went wrong.");
        assert_eq!(modal.actions.len(), 1);
        assert_eq!(modal.actions[0].command, ModalCommand::Dismiss);
        assert_eq!(modal.actions[0].style, ButtonStyle::Primary);
    }
}
