//! View State
//!
//! The render-only state the TUI derives from `AppMessage`s. The
//! surface has no business logic: it stores what the controller says
//! and draws whatever belongs to the active screen. Data that arrives
//! for a screen that is no longer active is stored but never drawn,
//! which is how stale in-flight results are discarded safely.

use std::time::{Duration, Instant};

use famstar_core::{
    AppMessage, HomeView, InlineKind, MemberTile, ModalCommand, ModalSpec, RankingRow, Rating,
    RecentVoteRow, Screen, ToastSpec,
};

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Inline text attached to one screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineText {
    /// The screen the text belongs to.
    pub screen: Screen,
    /// Error or notice.
    pub kind: InlineKind,
    /// The text itself.
    pub message: String,
}

/// An open modal plus which of its actions is highlighted.
#[derive(Clone, Debug)]
pub struct ModalState {
    /// The dialog content.
    pub spec: ModalSpec,
    /// Index of the highlighted action.
    pub selected: usize,
}

impl ModalState {
    /// Move the highlight by `delta`, clamped to the action range.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.spec.actions.len();
        if len == 0 {
            return;
        }
        let current = self.selected as isize;
        self.selected = (current + delta).rem_euclid(len as isize) as usize;
    }

    /// The command behind the highlighted action.
    pub fn current_command(&self) -> Option<ModalCommand> {
        self.spec.actions.get(self.selected).map(|a| a.command)
    }
}

/// A live toast and when it appeared.
#[derive(Clone, Debug)]
pub struct ToastState {
    /// The toast content.
    pub spec: ToastSpec,
    /// When it was shown.
    pub shown_at: Instant,
}

/// Everything the renderer needs, derived from `AppMessage`s.
#[derive(Debug, Default)]
pub struct ViewState {
    /// The active screen.
    pub screen: Screen,
    /// Whether the blocking loading overlay is up.
    pub loading: bool,
    /// Inline error/notice text, if any.
    pub inline: Option<InlineText>,
    /// Member grid for the user picker.
    pub members: Vec<MemberTile>,
    /// Who the password prompt is for.
    pub password_for: Option<MemberTile>,
    /// Who the reset view is for.
    pub forgot_for: Option<MemberTile>,
    /// Home screen content.
    pub home: Option<HomeView>,
    /// Vote-target list.
    pub targets: Vec<MemberTile>,
    /// Who the star entry is for.
    pub rate_target: Option<MemberTile>,
    /// Highlighted star value.
    pub selected_rating: Option<Rating>,
    /// Ranking rows.
    pub ranking: Vec<RankingRow>,
    /// Recent-vote rows.
    pub recent: Vec<RecentVoteRow>,
    /// Open modal, if any.
    pub modal: Option<ModalState>,
    /// Live toast, if any.
    pub toast: Option<ToastState>,
}

impl ViewState {
    /// Fresh view state showing the welcome screen.
    pub fn new() -> Self {
        Self {
            screen: Screen::Welcome,
            ..Self::default()
        }
    }

    /// Apply one controller message.
    ///
    /// Side-effect messages (feedback, rain, timed returns) are
    /// handled by the app loop before they reach here; applying them
    /// anyway is a no-op.
    pub fn apply_message(&mut self, msg: AppMessage, now: Instant) {
        match msg {
            AppMessage::Screen(screen) => {
                self.screen = screen;
            }
            AppMessage::Inline {
                screen,
                kind,
                message,
            } => {
                self.inline = Some(InlineText {
                    screen,
                    kind,
                    message,
                });
            }
            AppMessage::ClearInline => {
                self.inline = None;
            }
            AppMessage::MemberList(members) => {
                self.members = members;
            }
            AppMessage::PasswordPrompt(tile) => {
                self.password_for = Some(tile);
            }
            AppMessage::ForgotPrompt(tile) => {
                self.forgot_for = Some(tile);
            }
            AppMessage::HomeLoaded(home) => {
                self.home = Some(home);
            }
            AppMessage::VoteTargets(targets) => {
                self.targets = targets;
            }
            AppMessage::RatePrompt(tile) => {
                self.rate_target = Some(tile);
                self.selected_rating = None;
            }
            AppMessage::RatingSelected(rating) => {
                self.selected_rating = Some(rating);
            }
            AppMessage::RankingLoaded(rows) => {
                self.ranking = rows;
            }
            AppMessage::RecentVotesLoaded(rows) => {
                self.recent = rows;
            }
            AppMessage::Modal(spec) => {
                self.modal = Some(ModalState { spec, selected: 0 });
            }
            AppMessage::ModalClose => {
                self.modal = None;
            }
            AppMessage::Toast(spec) => {
                self.toast = Some(ToastState {
                    spec,
                    shown_at: now,
                });
            }
            AppMessage::SessionEnded => {
                self.reset_session_state();
            }
            // Performed by the app loop, not stored.
            AppMessage::PlayFeedback(_)
            | AppMessage::Haptic(_)
            | AppMessage::RainStart(_)
            | AppMessage::RainStop
            | AppMessage::ReturnLater { .. } => {}
        }
    }

    /// Expire the toast once its time is up.
    pub fn update(&mut self, now: Instant) {
        if let Some(toast) = &self.toast {
            if now.duration_since(toast.shown_at) >= TOAST_DURATION {
                self.toast = None;
            }
        }
    }

    /// Inline text for the active screen, if any.
    pub fn inline_for_screen(&self) -> Option<&InlineText> {
        self.inline.as_ref().filter(|i| i.screen == self.screen)
    }

    /// Discard everything tied to the ended session.
    fn reset_session_state(&mut self) {
        let members = std::mem::take(&mut self.members);
        *self = Self {
            screen: self.screen,
            members,
            ..Self::default()
        };
    }
}
