//! Controller - The Application Core
//!
//! The controller owns all application state: the session, the visible
//! screen, the pending vote selection, and the modal. It consumes
//! [`UiEvent`]s from a surface, talks to the backend, drains the
//! realtime queue, and emits declarative [`AppMessage`]s for the
//! surface to render.
//!
//! # Design Philosophy
//!
//! The controller is UI-agnostic: it doesn't know whether a TUI, a web
//! surface or a test harness sits on the other end of the channel.
//! Every handler body runs on the surface's single-threaded loop, so
//! no locking is needed; realtime events are queued and drained on the
//! same loop, preserving arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::VoteBackend;
use crate::error::CoreError;
use crate::events::UiEvent;
use crate::feedback::{rain_for_position, FeedbackProfile};
use crate::members::{Member, MemberDirectory};
use crate::messages::{AppMessage, InlineKind};
use crate::ranking::{compute_ranking, ranking_position, RankingEntry};
use crate::screen::{
    Badge, ButtonStyle, HomeView, MemberTile, ModalButton, ModalCommand, ModalSpec, RankingRow,
    RecentVoteRow, Screen, ToastSpec,
};
use crate::session::Session;
use crate::votes::{NewVote, Rating, VoteInsert};

/// Delay before the reset-confirmation view returns to password entry.
const RESET_RETURN_MS: u64 = 3000;

/// How many rows the recent-votes screen shows.
const RECENT_VOTES_LIMIT: usize = 10;

/// The single owner of all application state.
pub struct Controller<B: VoteBackend> {
    directory: MemberDirectory,
    backend: Arc<B>,
    tx: mpsc::Sender<AppMessage>,

    screen: Screen,
    session: Option<Session>,
    /// Member picked on the login screen.
    selected_username: Option<String>,
    /// Target picked on the vote screen.
    voting_for: Option<String>,
    /// Star value picked on the rating screen.
    selected_rating: Option<Rating>,
}

impl<B: VoteBackend> Controller<B> {
    /// Create a controller. Messages are emitted on `tx`.
    pub fn new(directory: MemberDirectory, backend: Arc<B>, tx: mpsc::Sender<AppMessage>) -> Self {
        Self {
            directory,
            backend,
            tx,
            screen: Screen::Welcome,
            session: None,
            selected_username: None,
            voting_for: None,
            selected_rating: None,
        }
    }

    /// The currently visible screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Whether a session is active.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Handle one surface event. All state changes and backend calls
    /// for the event complete before this returns.
    pub async fn handle_event(&mut self, event: UiEvent) {
        tracing::debug!(?event, "handling surface event");
        match event {
            UiEvent::Start => self.show_welcome().await,
            UiEvent::GoToLogin => self.open_member_picker().await,
            UiEvent::GoToWelcome => self.show_welcome().await,
            UiEvent::SelectMember { username } => self.select_member(username).await,
            UiEvent::BackToMembers => {
                self.selected_username = None;
                self.send(AppMessage::ClearInline).await;
                self.set_screen(Screen::PickUser).await;
            }
            UiEvent::SubmitPassword { password } => self.login(password).await,
            UiEvent::ForgotPassword => self.open_forgot_password().await,
            UiEvent::SendPasswordReset => self.send_password_reset().await,
            UiEvent::BackToPassword => {
                self.send(AppMessage::ClearInline).await;
                self.set_screen(Screen::Password).await;
            }
            UiEvent::SubmitNewPassword { password, confirm } => {
                self.change_password(password, confirm).await;
            }
            UiEvent::CancelPasswordChange => self.logout().await,
            UiEvent::GoHome => self.set_screen(Screen::Home).await,
            UiEvent::GoToVote => self.open_vote_targets().await,
            UiEvent::GoToRanking => self.open_ranking().await,
            UiEvent::GoToRecentVotes => self.open_recent_votes().await,
            UiEvent::SelectTarget { username } => self.select_target(username).await,
            UiEvent::BackToTargets => {
                self.voting_for = None;
                self.selected_rating = None;
                self.set_screen(Screen::VoteTargets).await;
            }
            UiEvent::SelectRating { rating } => self.select_rating(rating).await,
            UiEvent::ConfirmVote => self.confirm_vote().await,
            UiEvent::RequestLogout => self.open_logout_modal().await,
            UiEvent::ModalAction(command) => self.modal_action(command).await,
        }
    }

    /// Drain the realtime queue and surface an alert per event. Called
    /// from the surface's frame loop.
    pub async fn poll_realtime(&mut self) {
        let events = match self.session.as_mut() {
            Some(session) => session.drain_realtime(),
            None => return,
        };

        for event in events {
            self.notify_vote_received(event).await;
        }
    }

    // ============================================
    // Authentication flows
    // ============================================

    async fn show_welcome(&mut self) {
        self.set_screen(Screen::Welcome).await;
    }

    async fn open_member_picker(&mut self) {
        let tiles: Vec<MemberTile> = self.directory.iter().map(tile).collect();
        self.send(AppMessage::MemberList(tiles)).await;
        self.set_screen(Screen::PickUser).await;
    }

    async fn select_member(&mut self, username: String) {
        let Some(member) = self.directory.by_username(&username) else {
            tracing::warn!("unknown member picked: {username}");
            return;
        };
        let prompt = tile(member);
        self.selected_username = Some(username);
        self.send(AppMessage::ClearInline).await;
        self.send(AppMessage::PasswordPrompt(prompt)).await;
        self.set_screen(Screen::Password).await;
    }

    async fn login(&mut self, password: String) {
        let Some(member) = self.selected_member().cloned() else {
            self.inline_error(Screen::Password, "Pick a user first").await;
            return;
        };
        if password.is_empty() {
            self.inline_error(Screen::Password, "Enter your password")
                .await;
            return;
        }

        match self.backend.sign_in(&member.email, &password).await {
            Ok(auth) => {
                tracing::info!(user = %member.username, "signed in");
                self.session = Some(Session::new(auth.profile));
                self.send(AppMessage::ClearInline).await;
                if auth.needs_password_change {
                    self.set_screen(Screen::ChangePassword).await;
                } else {
                    self.enter_home().await;
                }
            }
            Err(CoreError::AuthFailed) => {
                self.inline_error(Screen::Password, "Wrong password").await;
            }
            Err(err) => {
                tracing::warn!("sign-in failed: {err}");
                self.inline_error(Screen::Password, "Service unavailable, try again")
                    .await;
            }
        }
    }

    async fn open_forgot_password(&mut self) {
        let Some(member) = self.selected_member().cloned() else {
            self.inline_error(Screen::Password, "Pick a user first").await;
            return;
        };
        self.send(AppMessage::ClearInline).await;
        self.send(AppMessage::ForgotPrompt(tile(&member))).await;
        self.set_screen(Screen::ForgotPassword).await;
    }

    async fn send_password_reset(&mut self) {
        let Some(member) = self.selected_member().cloned() else {
            self.inline_error(Screen::ForgotPassword, "No user selected")
                .await;
            return;
        };

        if member.has_placeholder_email() {
            self.inline_error(
                Screen::ForgotPassword,
                "Ask the administrator to register your real email address first",
            )
            .await;
            return;
        }

        match self.backend.request_password_reset(&member.email).await {
            Ok(()) => {
                self.send(AppMessage::Inline {
                    screen: Screen::ForgotPassword,
                    kind: InlineKind::Notice,
                    message: "Email sent! Check your inbox".to_string(),
                })
                .await;
                self.send(AppMessage::ReturnLater {
                    after_ms: RESET_RETURN_MS,
                })
                .await;
            }
            Err(err) => {
                tracing::warn!("password reset failed: {err}");
                self.inline_error(Screen::ForgotPassword, "Could not send the reset email")
                    .await;
            }
        }
    }

    async fn change_password(&mut self, password: String, confirm: String) {
        if password != confirm {
            self.inline_error(Screen::ChangePassword, "Passwords do not match")
                .await;
            return;
        }
        if password.len() < 6 {
            self.inline_error(Screen::ChangePassword, "At least 6 characters")
                .await;
            return;
        }

        match self.backend.update_password(&password).await {
            Ok(()) => {
                self.send(AppMessage::ClearInline).await;
                self.enter_home().await;
            }
            Err(err) => {
                tracing::warn!("password change failed: {err}");
                self.inline_error(Screen::ChangePassword, "Could not update the password")
                    .await;
            }
        }
    }

    /// Land on the home screen: resolve the member, compute the
    /// ranking position and its badge, start the greeting rain, and
    /// (re)establish the realtime subscription.
    async fn enter_home(&mut self) {
        let Some(profile) = self.session.as_ref().map(|s| s.profile.clone()) else {
            return;
        };

        let member = self.directory.for_account(&profile.email);
        let (name, avatar) = match member {
            Some(m) => (m.name.clone(), m.avatar.clone()),
            None => {
                tracing::warn!("no member maps to account {}", profile.email);
                (profile.display_label().to_string(), String::new())
            }
        };

        // A failed event fetch leaves the rank unknown; the home
        // screen renders without a badge.
        let rank = match self.fetch_ranking().await {
            Ok(entries) => ranking_position(&entries, profile.id),
            Err(err) => {
                tracing::warn!("ranking fetch failed: {err}");
                None
            }
        };

        let badge = rank.and_then(|pos| {
            if pos.rank == 1 {
                Some(Badge::Crown)
            } else if pos.is_last {
                Some(Badge::Poop)
            } else {
                None
            }
        });

        self.send(AppMessage::HomeLoaded(HomeView {
            name,
            avatar,
            badge,
            rank,
        }))
        .await;
        self.set_screen(Screen::Home).await;

        if let Some(spec) = rank.and_then(rain_for_position) {
            self.send(AppMessage::RainStart(spec)).await;
        }

        self.resubscribe(profile.id).await;
    }

    /// Establish the realtime subscription for the signed-in profile,
    /// tearing down any previous one so exactly one is ever live.
    async fn resubscribe(&mut self, target: crate::profile::ProfileId) {
        match self.backend.subscribe_votes(target).await {
            Ok(subscription) => {
                if let Some(session) = self.session.as_mut() {
                    session.attach_subscription(subscription);
                }
            }
            Err(err) => {
                // Realtime is best-effort; the app works without it.
                tracing::warn!("realtime subscription failed: {err}");
            }
        }
    }

    // ============================================
    // Voting flows
    // ============================================

    async fn open_vote_targets(&mut self) {
        let Some(profile) = self.session.as_ref().map(|s| s.profile.clone()) else {
            return;
        };
        let username = self
            .directory
            .for_account(&profile.email)
            .map(|m| m.username.clone())
            .unwrap_or_else(|| profile.username().to_string());

        let tiles: Vec<MemberTile> = self
            .directory
            .others(&username)
            .into_iter()
            .map(tile)
            .collect();
        self.send(AppMessage::VoteTargets(tiles)).await;
        self.set_screen(Screen::VoteTargets).await;
    }

    async fn select_target(&mut self, username: String) {
        let Some(member) = self.directory.by_username(&username) else {
            tracing::warn!("unknown vote target picked: {username}");
            return;
        };
        let prompt = tile(member);
        self.voting_for = Some(username);
        self.selected_rating = None;
        self.send(AppMessage::RatePrompt(prompt)).await;
        self.set_screen(Screen::VoteRate).await;
    }

    async fn select_rating(&mut self, raw: u8) {
        let rating = match Rating::new(raw) {
            Ok(rating) => rating,
            Err(_) => {
                tracing::warn!("out-of-range rating ignored: {raw}");
                return;
            }
        };
        self.selected_rating = Some(rating);
        self.send(AppMessage::RatingSelected(rating)).await;
        self.send(AppMessage::PlayFeedback(FeedbackProfile::for_rating(rating)))
            .await;
    }

    async fn confirm_vote(&mut self) {
        // Local preconditions: both selections present. Nothing
        // reaches the backend otherwise.
        let (Some(rating), Some(target_username)) =
            (self.selected_rating, self.voting_for.clone())
        else {
            self.send(AppMessage::Modal(ModalSpec::notice(
                "[!]",
                "HOLD ON",
                "Pick a rating first",
            )))
            .await;
            return;
        };
        let Some(session_profile) = self.session.as_ref().map(|s| s.profile.clone()) else {
            return;
        };
        let Some(member) = self.directory.by_username(&target_username).cloned() else {
            return;
        };

        let target = match self.backend.profile_by_email(&member.email).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!("vote target has no profile: {}", member.email);
                self.send(AppMessage::Modal(ModalSpec::notice(
                    "[!]",
                    "ERROR",
                    "That member has no account yet",
                )))
                .await;
                return;
            }
            Err(err) => {
                tracing::warn!("target lookup failed: {err}");
                self.send(AppMessage::Modal(ModalSpec::notice(
                    "[!]",
                    "ERROR",
                    "There was a problem recording your vote. Try again",
                )))
                .await;
                return;
            }
        };

        let vote = NewVote {
            voter_id: session_profile.id,
            voted_for_id: target.id,
            rating,
        };

        match self.backend.insert_vote(&vote).await {
            Ok(()) => {
                tracing::info!(target = %member.username, rating = rating.value(), "vote recorded");
                self.send(AppMessage::Haptic(FeedbackProfile::success_haptic()))
                    .await;
                if let Some(rain) = FeedbackProfile::for_rating(rating).rain {
                    self.send(AppMessage::RainStart(rain)).await;
                }
                let stars = if rating.value() == 1 { "star" } else { "stars" };
                self.send(AppMessage::Modal(ModalSpec {
                    icon: vote_icon(rating).to_string(),
                    title: "VOTE RECORDED!".to_string(),
                    message: format!("You gave {} {stars} to {}", rating.value(), member.name),
                    actions: vec![ModalButton::primary("OK", ModalCommand::AcknowledgeVote)],
                }))
                .await;
            }
            Err(err) => {
                // Selection state stays untouched so the user can
                // simply retry.
                tracing::warn!("vote insert failed: {err}");
                self.send(AppMessage::Modal(ModalSpec::notice(
                    "[!]",
                    "ERROR",
                    "There was a problem recording your vote. Try again",
                )))
                .await;
            }
        }
    }

    // ============================================
    // Ranking & history
    // ============================================

    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, CoreError> {
        let votes = self.backend.list_votes().await?;
        let profiles = self.backend.list_profiles().await?;
        Ok(compute_ranking(&votes, &profiles))
    }

    async fn open_ranking(&mut self) {
        match self.fetch_ranking().await {
            Ok(entries) => {
                let total = entries.len();
                let rows: Vec<RankingRow> = entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| {
                        let member = self.directory.for_account(&entry.profile.email);
                        RankingRow {
                            position: i + 1,
                            name: member
                                .map(|m| m.name.clone())
                                .unwrap_or_else(|| entry.profile.display_label().to_string()),
                            icon: member.map(|m| m.icon.clone()).unwrap_or_default(),
                            average: entry.average,
                            count: entry.count,
                            is_first: i == 0,
                            is_last: i + 1 == total,
                        }
                    })
                    .collect();
                self.send(AppMessage::RankingLoaded(rows)).await;
                self.set_screen(Screen::Ranking).await;
            }
            Err(err) => {
                tracing::warn!("ranking load failed: {err}");
                self.inline_error(Screen::Ranking, "Could not load the ranking")
                    .await;
                self.set_screen(Screen::Ranking).await;
            }
        }
    }

    async fn open_recent_votes(&mut self) {
        match self.backend.recent_votes(RECENT_VOTES_LIMIT).await {
            Ok(votes) => {
                let now = chrono::Utc::now();
                let rows: Vec<RecentVoteRow> = votes
                    .into_iter()
                    .map(|vote| RecentVoteRow {
                        age: vote.age_label(now),
                        voter: vote.voter_name,
                        voted_for: vote.voted_for_name,
                        rating: vote.rating,
                    })
                    .collect();
                self.send(AppMessage::RecentVotesLoaded(rows)).await;
                self.set_screen(Screen::RecentVotes).await;
            }
            Err(err) => {
                tracing::warn!("recent votes load failed: {err}");
                self.inline_error(Screen::RecentVotes, "Could not load the latest votes")
                    .await;
                self.set_screen(Screen::RecentVotes).await;
            }
        }
    }

    // ============================================
    // Session teardown & modals
    // ============================================

    async fn open_logout_modal(&mut self) {
        self.send(AppMessage::Modal(ModalSpec {
            icon: "[?]".to_string(),
            title: "LEAVE THE APP?".to_string(),
            message: "Are you sure you want to log out?".to_string(),
            actions: vec![
                ModalButton {
                    label: "CANCEL".to_string(),
                    command: ModalCommand::Dismiss,
                    style: ButtonStyle::Secondary,
                },
                ModalButton::primary("LOG OUT", ModalCommand::ConfirmLogout),
            ],
        }))
        .await;
    }

    async fn modal_action(&mut self, command: ModalCommand) {
        self.send(AppMessage::ModalClose).await;
        match command {
            ModalCommand::Dismiss => {}
            ModalCommand::ConfirmLogout => self.logout().await,
            ModalCommand::AcknowledgeVote => {
                self.send(AppMessage::RainStop).await;
                self.voting_for = None;
                self.selected_rating = None;
                self.set_screen(Screen::Home).await;
            }
        }
    }

    async fn logout(&mut self) {
        self.send(AppMessage::RainStop).await;

        if let Some(session) = self.session.take() {
            session.end();
        }
        if let Err(err) = self.backend.sign_out().await {
            // The local session is gone regardless.
            tracing::warn!("sign-out failed: {err}");
        }

        self.selected_username = None;
        self.voting_for = None;
        self.selected_rating = None;
        self.send(AppMessage::SessionEnded).await;
        self.set_screen(Screen::Welcome).await;
    }

    // ============================================
    // Realtime alerts
    // ============================================

    async fn notify_vote_received(&mut self, event: VoteInsert) {
        // Resolve the voter's display name; an unresolvable voter
        // drops the event with no alert and no retry.
        let voter = match self.backend.profile_by_id(event.voter_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::debug!("dropping vote event from unknown voter {}", event.voter_id);
                return;
            }
            Err(err) => {
                tracing::debug!("dropping vote event, voter lookup failed: {err}");
                return;
            }
        };

        let name = self
            .directory
            .for_account(&voter.email)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| voter.display_label().to_string());

        self.send(AppMessage::Toast(ToastSpec {
            icon: vote_icon(event.rating).to_string(),
            title: "NEW VOTE!".to_string(),
            message: format!("{name} rated you {}", event.rating.stars()),
        }))
        .await;
        self.send(AppMessage::PlayFeedback(FeedbackProfile::for_rating(
            event.rating,
        )))
        .await;
    }

    // ============================================
    // Helpers
    // ============================================

    fn selected_member(&self) -> Option<&Member> {
        self.selected_username
            .as_deref()
            .and_then(|u| self.directory.by_username(u))
    }

    async fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.send(AppMessage::Screen(screen)).await;
    }

    async fn inline_error(&mut self, screen: Screen, message: &str) {
        self.send(AppMessage::Inline {
            screen,
            kind: InlineKind::Error,
            message: message.to_string(),
        })
        .await;
    }

    async fn send(&self, message: AppMessage) {
        if self.tx.send(message).await.is_err() {
            tracing::warn!("surface channel closed, message dropped");
        }
    }
}

/// Icon token for a rating-related alert or modal.
fn vote_icon(rating: Rating) -> &'static str {
    if rating.is_lowest() {
        "[x]"
    } else if rating.is_highest() {
        "[*]"
    } else {
        "[+]"
    }
}

fn tile(member: &Member) -> MemberTile {
    MemberTile {
        username: member.username.clone(),
        name: member.name.clone(),
        icon: member.icon.clone(),
        avatar: member.avatar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::VoteSubscription;
    use crate::profile::{Profile, ProfileId};
    use crate::session::AuthSession;
    use crate::votes::{RecentVote, VoteRow};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ========================================================================
    // Mock backend
    // ========================================================================

    #[derive(Default)]
    struct MockState {
        profiles: Vec<Profile>,
        votes: Vec<VoteRow>,
        sign_in_calls: usize,
        insert_calls: usize,
        subscribe_calls: usize,
        lookup_calls: usize,
        fail_sign_in: bool,
        fail_insert: bool,
        /// Senders of every subscription handed out, oldest first.
        subscription_senders: Vec<mpsc::Sender<VoteInsert>>,
    }

    #[derive(Default)]
    struct MockBackend {
        state: Mutex<MockState>,
    }

    impl MockBackend {
        fn with_profiles(profiles: Vec<Profile>) -> Self {
            Self {
                state: Mutex::new(MockState {
                    profiles,
                    ..MockState::default()
                }),
            }
        }

        fn insert_calls(&self) -> usize {
            self.state.lock().unwrap().insert_calls
        }
    }

    #[async_trait]
    impl VoteBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthSession, CoreError> {
            let mut state = self.state.lock().unwrap();
            state.sign_in_calls += 1;
            if state.fail_sign_in {
                return Err(CoreError::AuthFailed);
            }
            let profile = state
                .profiles
                .iter()
                .find(|p| p.email == email)
                .cloned()
                .ok_or(CoreError::AuthFailed)?;
            Ok(AuthSession {
                profile,
                needs_password_change: false,
            })
        }

        async fn sign_out(&self) -> Result<(), CoreError> {
            Ok(())
        }

        async fn update_password(&self, _new_password: &str) -> Result<(), CoreError> {
            Ok(())
        }

        async fn request_password_reset(&self, _email: &str) -> Result<(), CoreError> {
            Ok(())
        }

        async fn profile_by_id(&self, id: ProfileId) -> Result<Option<Profile>, CoreError> {
            let mut state = self.state.lock().unwrap();
            state.lookup_calls += 1;
            Ok(state.profiles.iter().find(|p| p.id == id).cloned())
        }

        async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>, CoreError> {
            let mut state = self.state.lock().unwrap();
            state.lookup_calls += 1;
            Ok(state.profiles.iter().find(|p| p.email == email).cloned())
        }

        async fn list_profiles(&self) -> Result<Vec<Profile>, CoreError> {
            Ok(self.state.lock().unwrap().profiles.clone())
        }

        async fn insert_vote(&self, vote: &NewVote) -> Result<(), CoreError> {
            let mut state = self.state.lock().unwrap();
            state.insert_calls += 1;
            if state.fail_insert {
                return Err(CoreError::SubmissionFailed("mock failure".into()));
            }
            state.votes.push(VoteRow {
                voted_for: vote.voted_for_id,
                rating: vote.rating,
            });
            Ok(())
        }

        async fn list_votes(&self) -> Result<Vec<VoteRow>, CoreError> {
            Ok(self.state.lock().unwrap().votes.clone())
        }

        async fn recent_votes(&self, _limit: usize) -> Result<Vec<RecentVote>, CoreError> {
            Ok(Vec::new())
        }

        async fn subscribe_votes(
            &self,
            _target: ProfileId,
        ) -> Result<VoteSubscription, CoreError> {
            let mut state = self.state.lock().unwrap();
            state.subscribe_calls += 1;
            let (tx, rx) = mpsc::channel(8);
            state.subscription_senders.push(tx);
            Ok(VoteSubscription::new(rx))
        }
    }

    // ========================================================================
    // Harness
    // ========================================================================

    fn profile(name: &str) -> Profile {
        Profile {
            id: ProfileId::random(),
            email: format!("{name}@famstar.local"),
            display_name: Some(name.to_string()),
        }
    }

    fn member(name: &str) -> Member {
        Member {
            username: name.to_string(),
            name: name.to_string(),
            icon: format!("{name}.png"),
            avatar: format!("{name}.gif"),
            email: format!("{name}@famstar.local"),
        }
    }

    struct Harness {
        controller: Controller<MockBackend>,
        backend: Arc<MockBackend>,
        rx: mpsc::Receiver<AppMessage>,
    }

    impl Harness {
        fn new(members: Vec<Member>, profiles: Vec<Profile>) -> Self {
            let backend = Arc::new(MockBackend::with_profiles(profiles));
            let (tx, rx) = mpsc::channel(100);
            let controller =
                Controller::new(MemberDirectory::new(members), backend.clone(), tx);
            Self {
                controller,
                backend,
                rx,
            }
        }

        fn drain(&mut self) -> Vec<AppMessage> {
            let mut messages = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                messages.push(msg);
            }
            messages
        }

        async fn login_as(&mut self, username: &str) {
            self.controller
                .handle_event(UiEvent::SelectMember {
                    username: username.to_string(),
                })
                .await;
            self.controller
                .handle_event(UiEvent::SubmitPassword {
                    password: "secret".to_string(),
                })
                .await;
            self.drain();
        }
    }

    fn default_harness() -> Harness {
        let members = vec![member("ana"), member("bruno"), member("celes")];
        let profiles = vec![profile("ana"), profile("bruno"), profile("celes")];
        Harness::new(members, profiles)
    }

    // ========================================================================
    // Validation gates
    // ========================================================================

    #[tokio::test]
    async fn test_empty_password_makes_no_backend_call() {
        let mut h = default_harness();
        h.controller
            .handle_event(UiEvent::SelectMember {
                username: "ana".into(),
            })
            .await;
        h.controller
            .handle_event(UiEvent::SubmitPassword {
                password: String::new(),
            })
            .await;

        assert_eq!(h.backend.state.lock().unwrap().sign_in_calls, 0);
        let messages = h.drain();
        assert!(messages.iter().any(|m| matches!(
            m,
            AppMessage::Inline {
                kind: InlineKind::Error,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_confirm_without_rating_makes_no_backend_call() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller
            .handle_event(UiEvent::SelectTarget {
                username: "bruno".into(),
            })
            .await;
        h.drain();

        h.controller.handle_event(UiEvent::ConfirmVote).await;

        assert_eq!(h.backend.insert_calls(), 0);
        assert_eq!(h.backend.state.lock().unwrap().lookup_calls, 0);
        let messages = h.drain();
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::Modal(spec) if spec.title == "HOLD ON")));
    }

    #[tokio::test]
    async fn test_out_of_range_rating_ignored() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller
            .handle_event(UiEvent::SelectTarget {
                username: "bruno".into(),
            })
            .await;
        h.drain();

        h.controller
            .handle_event(UiEvent::SelectRating { rating: 9 })
            .await;
        h.controller.handle_event(UiEvent::ConfirmVote).await;

        assert_eq!(h.backend.insert_calls(), 0);
    }

    // ========================================================================
    // Vote submission
    // ========================================================================

    #[tokio::test]
    async fn test_successful_vote_records_and_returns_home() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller
            .handle_event(UiEvent::SelectTarget {
                username: "bruno".into(),
            })
            .await;
        h.controller
            .handle_event(UiEvent::SelectRating { rating: 5 })
            .await;
        h.drain();

        h.controller.handle_event(UiEvent::ConfirmVote).await;
        let messages = h.drain();

        assert_eq!(h.backend.insert_calls(), 1);
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::RainStart(spec) if spec.count == 40)));
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::Modal(spec) if spec.title == "VOTE RECORDED!")));

        // Dismissing the success modal clears selection and goes home.
        h.controller
            .handle_event(UiEvent::ModalAction(ModalCommand::AcknowledgeVote))
            .await;
        let messages = h.drain();
        assert!(messages.contains(&AppMessage::RainStop));
        assert!(messages.contains(&AppMessage::Screen(Screen::Home)));
        assert!(h.controller.selected_rating.is_none());
        assert!(h.controller.voting_for.is_none());
    }

    #[tokio::test]
    async fn test_unknown_target_appends_nothing_and_surfaces_error() {
        // "ghost" is a configured member with no backend profile.
        let members = vec![member("ana"), member("ghost")];
        let profiles = vec![profile("ana")];
        let mut h = Harness::new(members, profiles);
        h.login_as("ana").await;

        h.controller
            .handle_event(UiEvent::SelectTarget {
                username: "ghost".into(),
            })
            .await;
        h.controller
            .handle_event(UiEvent::SelectRating { rating: 3 })
            .await;
        h.drain();
        h.controller.handle_event(UiEvent::ConfirmVote).await;

        assert_eq!(h.backend.insert_calls(), 0);
        let messages = h.drain();
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::Modal(spec) if spec.title == "ERROR")));
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_selection_for_retry() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.backend.state.lock().unwrap().fail_insert = true;

        h.controller
            .handle_event(UiEvent::SelectTarget {
                username: "bruno".into(),
            })
            .await;
        h.controller
            .handle_event(UiEvent::SelectRating { rating: 4 })
            .await;
        h.drain();
        h.controller.handle_event(UiEvent::ConfirmVote).await;

        assert!(h.controller.voting_for.is_some());
        assert!(h.controller.selected_rating.is_some());

        // Retry succeeds with the same selection.
        h.backend.state.lock().unwrap().fail_insert = false;
        h.drain();
        h.controller.handle_event(UiEvent::ConfirmVote).await;
        assert_eq!(h.backend.insert_calls(), 2);
        assert_eq!(h.backend.state.lock().unwrap().votes.len(), 1);
    }

    #[tokio::test]
    async fn test_rating_selection_plays_feedback() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller
            .handle_event(UiEvent::SelectTarget {
                username: "bruno".into(),
            })
            .await;
        h.drain();

        h.controller
            .handle_event(UiEvent::SelectRating { rating: 1 })
            .await;
        let messages = h.drain();
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::RatingSelected(r) if r.value() == 1)));
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::PlayFeedback(_))));
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    #[tokio::test]
    async fn test_wrong_password_shows_generic_inline_error() {
        let mut h = default_harness();
        h.backend.state.lock().unwrap().fail_sign_in = true;
        h.controller
            .handle_event(UiEvent::SelectMember {
                username: "ana".into(),
            })
            .await;
        h.drain();
        h.controller
            .handle_event(UiEvent::SubmitPassword {
                password: "nope".into(),
            })
            .await;

        let messages = h.drain();
        assert!(messages.iter().any(|m| matches!(
            m,
            AppMessage::Inline {
                screen: Screen::Password,
                kind: InlineKind::Error,
                message,
            } if message == "Wrong password"
        )));
        assert!(!h.controller.has_session());
    }

    #[tokio::test]
    async fn test_login_lands_home_and_subscribes() {
        let mut h = default_harness();
        h.login_as("ana").await;

        assert!(h.controller.has_session());
        assert_eq!(h.controller.screen(), Screen::Home);
        assert_eq!(h.backend.state.lock().unwrap().subscribe_calls, 1);
    }

    #[tokio::test]
    async fn test_short_new_password_rejected_locally() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller
            .handle_event(UiEvent::SubmitNewPassword {
                password: "abc".into(),
                confirm: "abc".into(),
            })
            .await;
        let messages = h.drain();
        assert!(messages.iter().any(|m| matches!(
            m,
            AppMessage::Inline {
                screen: Screen::ChangePassword,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_placeholder_email_blocks_reset_request() {
        let mut h = default_harness();
        h.controller
            .handle_event(UiEvent::SelectMember {
                username: "ana".into(),
            })
            .await;
        h.controller.handle_event(UiEvent::ForgotPassword).await;
        h.drain();
        h.controller.handle_event(UiEvent::SendPasswordReset).await;

        let messages = h.drain();
        assert!(messages.iter().any(|m| matches!(
            m,
            AppMessage::Inline {
                screen: Screen::ForgotPassword,
                kind: InlineKind::Error,
                ..
            }
        )));
    }

    // ========================================================================
    // Subscriptions & realtime
    // ========================================================================

    #[tokio::test]
    async fn test_relogin_tears_down_stale_subscription() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller
            .handle_event(UiEvent::ModalAction(ModalCommand::ConfirmLogout))
            .await;
        h.drain();
        h.login_as("bruno").await;

        let state = h.backend.state.lock().unwrap();
        assert_eq!(state.subscribe_calls, 2);
        // The first session's channel is closed; only the second is live.
        assert!(state.subscription_senders[0].is_closed());
        assert!(!state.subscription_senders[1].is_closed());
    }

    #[tokio::test]
    async fn test_realtime_event_fires_exactly_one_toast() {
        let mut h = default_harness();
        h.login_as("ana").await;

        let voter_id = h.backend.state.lock().unwrap().profiles[1].id;
        let target_id = h.backend.state.lock().unwrap().profiles[0].id;
        let sender = h.backend.state.lock().unwrap().subscription_senders[0].clone();
        sender
            .send(VoteInsert {
                voter_id,
                voted_for_id: target_id,
                rating: Rating::new(5).unwrap(),
            })
            .await
            .unwrap();

        h.controller.poll_realtime().await;
        let messages = h.drain();
        let toasts: Vec<_> = messages
            .iter()
            .filter(|m| matches!(m, AppMessage::Toast(_)))
            .collect();
        assert_eq!(toasts.len(), 1);
        assert!(messages
            .iter()
            .any(|m| matches!(m, AppMessage::PlayFeedback(_))));

        // Nothing queued: polling again emits nothing.
        h.controller.poll_realtime().await;
        assert!(h.drain().is_empty());
    }

    #[tokio::test]
    async fn test_realtime_event_with_unknown_voter_dropped_silently() {
        let mut h = default_harness();
        h.login_as("ana").await;
        let target_id = h.backend.state.lock().unwrap().profiles[0].id;
        let sender = h.backend.state.lock().unwrap().subscription_senders[0].clone();
        sender
            .send(VoteInsert {
                voter_id: ProfileId::random(),
                voted_for_id: target_id,
                rating: Rating::new(2).unwrap(),
            })
            .await
            .unwrap();

        h.controller.poll_realtime().await;
        let messages = h.drain();
        assert!(!messages.iter().any(|m| matches!(m, AppMessage::Toast(_))));
    }

    // ========================================================================
    // Ranking & logout
    // ========================================================================

    #[tokio::test]
    async fn test_ranking_screen_rows_sorted() {
        let mut h = default_harness();
        h.login_as("ana").await;

        // bruno gets two fives, celes one three.
        let (bruno_id, celes_id) = {
            let state = h.backend.state.lock().unwrap();
            (state.profiles[1].id, state.profiles[2].id)
        };
        {
            let mut state = h.backend.state.lock().unwrap();
            let five = Rating::new(5).unwrap();
            let three = Rating::new(3).unwrap();
            state.votes.push(VoteRow {
                voted_for: bruno_id,
                rating: five,
            });
            state.votes.push(VoteRow {
                voted_for: bruno_id,
                rating: five,
            });
            state.votes.push(VoteRow {
                voted_for: celes_id,
                rating: three,
            });
        }

        h.controller.handle_event(UiEvent::GoToRanking).await;
        let messages = h.drain();
        let rows = messages
            .iter()
            .find_map(|m| match m {
                AppMessage::RankingLoaded(rows) => Some(rows.clone()),
                _ => None,
            })
            .expect("ranking rows");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "bruno");
        assert!(rows[0].is_first);
        assert_eq!(rows[0].average, 5.0);
        assert_eq!(rows[1].name, "celes");
        assert!(rows[2].is_last);
        assert_eq!(rows[2].count, 0);
    }

    #[tokio::test]
    async fn test_logout_clears_state_and_stops_rain() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller.handle_event(UiEvent::RequestLogout).await;
        h.drain();

        h.controller
            .handle_event(UiEvent::ModalAction(ModalCommand::ConfirmLogout))
            .await;
        let messages = h.drain();

        assert!(!h.controller.has_session());
        assert_eq!(h.controller.screen(), Screen::Welcome);
        assert!(messages.contains(&AppMessage::RainStop));
        assert!(messages.contains(&AppMessage::SessionEnded));
        assert!(h
            .backend
            .state
            .lock()
            .unwrap()
            .subscription_senders[0]
            .is_closed());
    }

    #[tokio::test]
    async fn test_logout_cancel_keeps_session() {
        let mut h = default_harness();
        h.login_as("ana").await;
        h.controller.handle_event(UiEvent::RequestLogout).await;
        h.controller
            .handle_event(UiEvent::ModalAction(ModalCommand::Dismiss))
            .await;

        assert!(h.controller.has_session());
        assert_eq!(h.controller.screen(), Screen::Home);
    }
}
