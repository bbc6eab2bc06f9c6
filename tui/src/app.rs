//! Main Application
//!
//! The App owns the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize, frame tick)
//! - Controller for all application logic
//! - ViewState for rendering
//!
//! Key events become `UiEvent`s sent to the controller; controller
//! messages update the `ViewState`; rendering is a pure function of
//! that state. Feedback messages (tones, haptics, rain) are performed
//! here because they touch surface-owned resources.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use famstar_core::{
    AppMessage, Controller, ParticleRain, RainSpec, Screen, UiEvent, VoteBackend,
};

use crate::screens::{self, RenderCtx};
use crate::sound::TonePlayer;
use crate::view::ViewState;

/// Target frame time (~30 fps keeps the rain smooth).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Haptic patterns at or above this many pulses ring the bell.
const BELL_THRESHOLD: usize = 3;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Main application state.
pub struct App<B: VoteBackend> {
    /// Is the app still running?
    running: bool,
    /// The application core.
    controller: Controller<B>,
    /// Messages from the controller.
    rx: mpsc::Receiver<AppMessage>,
    /// Display state derived from controller messages.
    view: ViewState,
    /// Tone playback (one voice max).
    sound: TonePlayer,
    /// Active particle rain, if any.
    rain: Option<ParticleRain>,
    rng: StdRng,

    // === Input state ===
    /// Selection index on list screens.
    list_index: usize,
    /// First text buffer (password / new password).
    input: String,
    /// Second text buffer (confirm password).
    input2: String,
    /// Whether the confirm field has focus.
    focus_second: bool,
    /// Scheduled timed return to the password screen.
    pending_return: Option<Instant>,

    /// Last frame time, for animation deltas.
    last_frame: Instant,
    /// Terminal size.
    size: (u16, u16),
}

impl<B: VoteBackend> App<B> {
    /// Create the app around a controller and its message channel.
    pub fn new(controller: Controller<B>, rx: mpsc::Receiver<AppMessage>) -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        Ok(Self {
            running: true,
            controller,
            rx,
            view: ViewState::new(),
            sound: TonePlayer::new(),
            rain: None,
            rng: StdRng::from_entropy(),
            list_index: 0,
            input: String::new(),
            input2: String::new(),
            focus_second: false,
            pending_return: None,
            last_frame: Instant::now(),
            size,
        })
    }

    /// Main event loop.
    pub async fn run(&mut self, terminal: &mut Term) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render the entry screen immediately.
        self.drain_messages();
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key, terminal).await?;
                            }
                            Event::Resize(w, h) => self.handle_resize(w, h),
                            _ => {}
                        }
                    }
                }

                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            // Realtime events arrive independently of any user action.
            self.controller.poll_realtime().await;
            self.drain_messages();

            // Timed return from the reset-confirmation view.
            if self.take_due_return() {
                self.dispatch(terminal, UiEvent::BackToPassword).await?;
            }

            self.update();
            self.render(terminal)?;

            let elapsed = frame_start.elapsed();
            if elapsed < FRAME_DURATION {
                tokio::time::sleep(FRAME_DURATION - elapsed).await;
            }
        }

        Ok(())
    }

    // ============================================
    // Event dispatch
    // ============================================

    /// Send one event to the controller. Backend-bound events paint
    /// the blocking loading overlay first; no input is processed until
    /// the call finishes.
    async fn dispatch(&mut self, terminal: &mut Term, event: UiEvent) -> anyhow::Result<()> {
        if event.needs_backend() {
            self.view.loading = true;
            self.render(terminal)?;
        }
        self.controller.handle_event(event).await;
        self.view.loading = false;
        self.drain_messages();
        Ok(())
    }

    /// Apply every pending controller message, performing the
    /// side-effectful ones here.
    fn drain_messages(&mut self) {
        let now = Instant::now();
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                AppMessage::PlayFeedback(profile) => {
                    self.sound.play(&profile.tone);
                    self.haptic(&profile.haptic);
                }
                AppMessage::Haptic(pattern) => self.haptic(&pattern),
                AppMessage::RainStart(spec) => self.start_rain(spec),
                AppMessage::RainStop => self.rain = None,
                AppMessage::ReturnLater { after_ms } => {
                    self.pending_return = Some(now + Duration::from_millis(after_ms));
                }
                AppMessage::Screen(screen) => {
                    if screen != self.view.screen {
                        self.reset_input_state();
                    }
                    self.view.apply_message(AppMessage::Screen(screen), now);
                }
                other => self.view.apply_message(other, now),
            }
        }
    }

    /// Handle keyboard input.
    async fn handle_key(
        &mut self,
        key: crossterm::event::KeyEvent,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        // The loading overlay blocks all interaction.
        if self.view.loading {
            return Ok(());
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return Ok(());
        }

        // An open modal swallows everything except its own navigation.
        if self.view.modal.is_some() {
            self.handle_modal_key(key.code, terminal).await?;
            return Ok(());
        }

        match self.view.screen {
            Screen::Welcome => self.handle_welcome_key(key.code).await,
            Screen::PickUser => self.handle_pick_key(key.code, terminal).await?,
            Screen::Password => self.handle_password_key(key.code, terminal).await?,
            Screen::ForgotPassword => self.handle_forgot_key(key.code, terminal).await?,
            Screen::ChangePassword => self.handle_change_key(key.code, terminal).await?,
            Screen::Home => self.handle_home_key(key.code, terminal).await?,
            Screen::VoteTargets => self.handle_targets_key(key.code, terminal).await?,
            Screen::VoteRate => self.handle_rate_key(key.code, terminal).await?,
            Screen::Ranking => self.handle_ranking_key(key.code, terminal).await?,
            Screen::RecentVotes => self.handle_recent_key(key.code, terminal).await?,
        }
        Ok(())
    }

    async fn handle_modal_key(&mut self, code: KeyCode, terminal: &mut Term) -> anyhow::Result<()> {
        match code {
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                if let Some(modal) = self.view.modal.as_mut() {
                    modal.move_selection(-1);
                }
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                if let Some(modal) = self.view.modal.as_mut() {
                    modal.move_selection(1);
                }
            }
            KeyCode::Enter => {
                let command = self.view.modal.as_ref().and_then(|m| m.current_command());
                if let Some(command) = command {
                    self.dispatch(terminal, UiEvent::ModalAction(command)).await?;
                }
            }
            // Modals are dismissed by an action, never by Esc.
            _ => {}
        }
        Ok(())
    }

    async fn handle_welcome_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Char('l') => {
                self.controller.handle_event(UiEvent::GoToLogin).await;
                self.drain_messages();
            }
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            _ => {}
        }
    }

    async fn handle_pick_key(&mut self, code: KeyCode, terminal: &mut Term) -> anyhow::Result<()> {
        let len = self.view.members.len();
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(len, -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(len, 1),
            KeyCode::Enter => {
                if let Some(member) = self.view.members.get(self.list_index) {
                    let username = member.username.clone();
                    self.dispatch(terminal, UiEvent::SelectMember { username })
                        .await?;
                }
            }
            KeyCode::Esc => self.dispatch(terminal, UiEvent::GoToWelcome).await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_password_key(
        &mut self,
        code: KeyCode,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        match code {
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                let password = std::mem::take(&mut self.input);
                self.dispatch(terminal, UiEvent::SubmitPassword { password })
                    .await?;
            }
            KeyCode::F(1) => self.dispatch(terminal, UiEvent::ForgotPassword).await?,
            KeyCode::Esc => {
                self.input.clear();
                self.dispatch(terminal, UiEvent::BackToMembers).await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_forgot_key(
        &mut self,
        code: KeyCode,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        match code {
            KeyCode::Enter => self.dispatch(terminal, UiEvent::SendPasswordReset).await?,
            KeyCode::Esc => {
                self.pending_return = None;
                self.dispatch(terminal, UiEvent::BackToPassword).await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_change_key(
        &mut self,
        code: KeyCode,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        match code {
            KeyCode::Tab | KeyCode::BackTab => self.focus_second = !self.focus_second,
            KeyCode::Char(c) => self.focused_input().push(c),
            KeyCode::Backspace => {
                self.focused_input().pop();
            }
            KeyCode::Enter => {
                let password = self.input.clone();
                let confirm = self.input2.clone();
                self.dispatch(terminal, UiEvent::SubmitNewPassword { password, confirm })
                    .await?;
            }
            KeyCode::Esc => {
                self.dispatch(terminal, UiEvent::CancelPasswordChange)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_home_key(&mut self, code: KeyCode, terminal: &mut Term) -> anyhow::Result<()> {
        match code {
            KeyCode::Char('v') => self.dispatch(terminal, UiEvent::GoToVote).await?,
            KeyCode::Char('r') => self.dispatch(terminal, UiEvent::GoToRanking).await?,
            KeyCode::Char('h') => self.dispatch(terminal, UiEvent::GoToRecentVotes).await?,
            KeyCode::Char('q') | KeyCode::Esc => {
                self.dispatch(terminal, UiEvent::RequestLogout).await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_targets_key(
        &mut self,
        code: KeyCode,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        let len = self.view.targets.len();
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(len, -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(len, 1),
            KeyCode::Enter => {
                if let Some(target) = self.view.targets.get(self.list_index) {
                    let username = target.username.clone();
                    self.dispatch(terminal, UiEvent::SelectTarget { username })
                        .await?;
                }
            }
            KeyCode::Esc => self.dispatch(terminal, UiEvent::GoHome).await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_rate_key(&mut self, code: KeyCode, terminal: &mut Term) -> anyhow::Result<()> {
        match code {
            KeyCode::Char(c @ '1'..='5') => {
                let rating = c as u8 - b'0';
                self.dispatch(terminal, UiEvent::SelectRating { rating })
                    .await?;
            }
            KeyCode::Left | KeyCode::Right => {
                let current = self.view.selected_rating.map(|r| r.value()).unwrap_or(0);
                let rating = if code == KeyCode::Left {
                    current.saturating_sub(1).max(1)
                } else {
                    (current + 1).min(5)
                };
                self.dispatch(terminal, UiEvent::SelectRating { rating })
                    .await?;
            }
            KeyCode::Enter => self.dispatch(terminal, UiEvent::ConfirmVote).await?,
            KeyCode::Esc => self.dispatch(terminal, UiEvent::BackToTargets).await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_ranking_key(
        &mut self,
        code: KeyCode,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        match code {
            KeyCode::Char('h') | KeyCode::Tab => {
                self.dispatch(terminal, UiEvent::GoToRecentVotes).await?;
            }
            KeyCode::Esc => self.dispatch(terminal, UiEvent::GoHome).await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_recent_key(
        &mut self,
        code: KeyCode,
        terminal: &mut Term,
    ) -> anyhow::Result<()> {
        match code {
            KeyCode::Esc => self.dispatch(terminal, UiEvent::GoToRanking).await?,
            _ => {}
        }
        Ok(())
    }

    // ============================================
    // Frame update & render
    // ============================================

    /// Update animations and timers.
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;

        self.view.update(now);
        self.sound.tick();

        // The rain self-quiesces; drop it once it reports finished so
        // nothing keeps ticking an empty field.
        if let Some(rain) = self.rain.as_mut() {
            if !rain.tick(delta, &mut self.rng) {
                self.rain = None;
            }
        }
    }

    fn render(&mut self, terminal: &mut Term) -> anyhow::Result<()> {
        let ctx = RenderCtx {
            view: &self.view,
            rain: self.rain.as_ref(),
            list_index: self.list_index,
            input: &self.input,
            input2: &self.input2,
            focus_second: self.focus_second,
        };
        terminal.draw(|frame| screens::render(frame, &ctx))?;
        Ok(())
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        if let Some(rain) = self.rain.as_mut() {
            rain.resize(f32::from(width), f32::from(height));
        }
    }

    // ============================================
    // Helpers
    // ============================================

    fn start_rain(&mut self, spec: RainSpec) {
        self.rain = Some(ParticleRain::new(
            spec,
            f32::from(self.size.0),
            f32::from(self.size.1),
        ));
    }

    /// Terminals can't vibrate; the strong patterns ring the bell as
    /// the closest available cue.
    fn haptic(&mut self, pattern: &[u32]) {
        if pattern.len() >= BELL_THRESHOLD {
            use std::io::Write;
            let mut stdout = io::stdout();
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
        }
        tracing::trace!(?pattern, "haptic pattern");
    }

    fn move_selection(&mut self, len: usize, delta: isize) {
        if len == 0 {
            return;
        }
        let current = self.list_index as isize;
        self.list_index = (current + delta).rem_euclid(len as isize) as usize;
    }

    fn focused_input(&mut self) -> &mut String {
        if self.focus_second {
            &mut self.input2
        } else {
            &mut self.input
        }
    }

    fn reset_input_state(&mut self) {
        self.list_index = 0;
        self.input.clear();
        self.input2.clear();
        self.focus_second = false;
    }

    fn take_due_return(&mut self) -> bool {
        match self.pending_return {
            Some(due) if Instant::now() >= due => {
                self.pending_return = None;
                // Only meaningful while the reset view is still up.
                self.view.screen == Screen::ForgotPassword
            }
            _ => false,
        }
    }
}
