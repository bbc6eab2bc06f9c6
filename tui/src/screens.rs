//! Screen Rendering
//!
//! One render function per screen plus the overlays (particle rain,
//! toast, modal, loading indicator). All of it is a stable renderer
//! over the declarative view models in [`ViewState`]; nothing here
//! mutates state.

use famstar_core::{Badge, ButtonStyle, InlineKind, MemberTile, ParticleRain, Screen};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::rain::render_rain;
use crate::theme;
use crate::view::ViewState;

/// Everything the renderer needs for one frame.
pub struct RenderCtx<'a> {
    /// The view state to draw.
    pub view: &'a ViewState,
    /// Active particle rain, if any.
    pub rain: Option<&'a ParticleRain>,
    /// Selection index for the active list screen.
    pub list_index: usize,
    /// First input buffer (passwords are masked on render).
    pub input: &'a str,
    /// Second input buffer (confirm field).
    pub input2: &'a str,
    /// Whether the confirm field has focus.
    pub focus_second: bool,
}

/// Draw one full frame: the active screen, then the overlays.
pub fn render(frame: &mut Frame, ctx: &RenderCtx) {
    let area = frame.area();

    match ctx.view.screen {
        Screen::Welcome => render_welcome(frame, area),
        Screen::PickUser => render_member_list(
            frame,
            area,
            "WHO ARE YOU?",
            &ctx.view.members,
            ctx.list_index,
            "↑/↓ pick · Enter continue · Esc back",
        ),
        Screen::Password => render_password(frame, area, ctx),
        Screen::ForgotPassword => render_forgot(frame, area, ctx),
        Screen::ChangePassword => render_change_password(frame, area, ctx),
        Screen::Home => render_home(frame, area, ctx),
        Screen::VoteTargets => render_member_list(
            frame,
            area,
            "WHO ARE YOU VOTING FOR?",
            &ctx.view.targets,
            ctx.list_index,
            "↑/↓ pick · Enter continue · Esc home",
        ),
        Screen::VoteRate => render_rate(frame, area, ctx),
        Screen::Ranking => render_ranking(frame, area, ctx),
        Screen::RecentVotes => render_recent(frame, area, ctx),
    }

    if let Some(rain) = ctx.rain {
        render_rain(rain, area, frame.buffer_mut());
    }
    if let Some(toast) = &ctx.view.toast {
        render_toast(frame, area, &toast.spec);
    }
    if let Some(modal) = &ctx.view.modal {
        render_modal(frame, area, modal);
    }
    if ctx.view.loading {
        render_loading(frame, area);
    }
}

// ============================================
// Screens
// ============================================

fn render_welcome(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::styled(
            "★ F A M S T A R ★",
            Style::default()
                .fg(theme::FAMSTAR_PINK)
                .add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::styled("the family star ranking", Style::default().fg(theme::DIM)),
        Line::from(""),
        Line::from(""),
        Line::styled("Enter · sign in", Style::default()),
        Line::styled("q · quit", Style::default().fg(theme::DIM)),
    ];
    let panel = centered_rect(area, 40, 12);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("")),
        panel,
    );
}

fn render_member_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    members: &[MemberTile],
    selected: usize,
    hint: &str,
) {
    let mut lines = vec![Line::from("")];
    for (i, member) in members.iter().enumerate() {
        let style = if i == selected {
            Style::default()
                .fg(theme::FAMSTAR_PINK)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if i == selected { "▸ " } else { "  " };
        lines.push(Line::styled(format!("{marker}{}", member.name), style));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(hint.to_string(), Style::default().fg(theme::DIM)));

    let height = (members.len() as u16).saturating_add(6).max(10);
    let panel = centered_rect(area, 44, height);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered(title)),
        panel,
    );
}

fn render_password(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let name = ctx
        .view
        .password_for
        .as_ref()
        .map(|m| m.name.as_str())
        .unwrap_or("?");

    let mut lines = vec![
        Line::from(""),
        Line::styled(
            format!("Hi, {name}!"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from("Your password:"),
        Line::styled(
            format!("{}_", mask(ctx.input)),
            Style::default().fg(theme::FAMSTAR_PINK),
        ),
        Line::from(""),
    ];
    push_inline(&mut lines, ctx.view);
    lines.push(Line::styled(
        "Enter sign in · F1 forgot password · Esc back",
        Style::default().fg(theme::DIM),
    ));

    let panel = centered_rect(area, 52, 12);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("SIGN IN")),
        panel,
    );
}

fn render_forgot(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let name = ctx
        .view
        .forgot_for
        .as_ref()
        .map(|m| m.name.as_str())
        .unwrap_or("?");

    let mut lines = vec![
        Line::from(""),
        Line::styled(
            format!("Forgot your password, {name}?"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from("We can email you a reset link."),
        Line::from(""),
    ];
    push_inline(&mut lines, ctx.view);
    lines.push(Line::styled(
        "Enter send email · Esc back",
        Style::default().fg(theme::DIM),
    ));

    let panel = centered_rect(area, 56, 12);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("PASSWORD RESET")),
        panel,
    );
}

fn render_change_password(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let focus = Style::default().fg(theme::FAMSTAR_PINK);
    let blur = Style::default().fg(theme::DIM);
    let (first_style, second_style) = if ctx.focus_second {
        (blur, focus)
    } else {
        (focus, blur)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from("Pick a new password (6+ characters)."),
        Line::from(""),
        Line::from(vec![
            Span::styled("New:     ", first_style),
            Span::raw(format!("{}_", mask(ctx.input))),
        ]),
        Line::from(vec![
            Span::styled("Confirm: ", second_style),
            Span::raw(format!("{}_", mask(ctx.input2))),
        ]),
        Line::from(""),
    ];
    push_inline(&mut lines, ctx.view);
    lines.push(Line::styled(
        "Tab switch field · Enter save · Esc sign out",
        Style::default().fg(theme::DIM),
    ));

    let panel = centered_rect(area, 56, 12);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("NEW PASSWORD")),
        panel,
    );
}

fn render_home(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let mut lines = vec![Line::from("")];
    match &ctx.view.home {
        Some(home) => {
            let badge = match home.badge {
                Some(Badge::Crown) => " ♛",
                Some(Badge::Poop) => " ●",
                None => "",
            };
            let badge_color = match home.badge {
                Some(Badge::Crown) => theme::GOLD,
                _ => Color::Rgb(139, 90, 43),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    home.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(badge.to_string(), Style::default().fg(badge_color)),
            ]));
            if let Some(rank) = home.rank {
                lines.push(Line::styled(
                    format!("You are #{} of {}", rank.rank, rank.total),
                    Style::default().fg(theme::DIM),
                ));
            }
        }
        None => lines.push(Line::from("...")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(""));
    lines.push(Line::styled(
        "v · vote for someone",
        Style::default().fg(theme::FAMSTAR_PINK),
    ));
    lines.push(Line::from("r · ranking"));
    lines.push(Line::from("h · latest votes"));
    lines.push(Line::styled("q · log out", Style::default().fg(theme::DIM)));

    let panel = centered_rect(area, 44, 14);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("HOME")),
        panel,
    );
}

fn render_rate(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let name = ctx
        .view
        .rate_target
        .as_ref()
        .map(|m| m.name.as_str())
        .unwrap_or("?");
    let selected = ctx.view.selected_rating.map(|r| r.value()).unwrap_or(0);

    let mut stars = Vec::new();
    for value in 1..=5u8 {
        let (glyph, style) = if value <= selected {
            (
                theme::STAR_FILLED,
                Style::default().fg(theme::GOLD).add_modifier(Modifier::BOLD),
            )
        } else {
            (theme::STAR_EMPTY, Style::default().fg(theme::DIM))
        };
        stars.push(Span::styled(format!(" {glyph} "), style));
    }

    let lines = vec![
        Line::from(""),
        Line::styled(
            format!("How many stars for {name}?"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from(stars),
        Line::from(""),
        Line::styled(
            "1-5 or ←/→ pick · Enter confirm · Esc back",
            Style::default().fg(theme::DIM),
        ),
    ];

    let panel = centered_rect(area, 52, 10);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("CAST YOUR VOTE")),
        panel,
    );
}

fn render_ranking(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let mut lines = vec![Line::from("")];
    for row in &ctx.view.ranking {
        let style = match row.position {
            1 => Style::default().fg(theme::GOLD).add_modifier(Modifier::BOLD),
            2 => Style::default().fg(theme::SILVER),
            3 => Style::default().fg(theme::BRONZE),
            _ => Style::default(),
        };
        let badge = if row.is_last { " ●" } else { "" };
        lines.push(Line::styled(
            format!(
                "{:>2}. {:<12} {}{badge}",
                row.position,
                row.name,
                row.score_label()
            ),
            style,
        ));
    }
    if ctx.view.ranking.is_empty() {
        lines.push(Line::styled(
            "Nothing here yet",
            Style::default().fg(theme::DIM),
        ));
    }
    lines.push(Line::from(""));
    push_inline(&mut lines, ctx.view);
    lines.push(Line::styled(
        "h latest votes · Esc home",
        Style::default().fg(theme::DIM),
    ));

    let height = (ctx.view.ranking.len() as u16).saturating_add(6).max(10);
    let panel = centered_rect(area, 56, height);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("RANKING")),
        panel,
    );
}

fn render_recent(frame: &mut Frame, area: Rect, ctx: &RenderCtx) {
    let mut lines = vec![Line::from("")];
    for row in &ctx.view.recent {
        lines.push(Line::from(vec![
            Span::styled(
                row.voter.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" voted "),
            Span::styled(
                row.voted_for.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {}", row.rating.stars()),
                Style::default().fg(theme::GOLD),
            ),
            Span::styled(format!("  {}", row.age), Style::default().fg(theme::DIM)),
        ]));
    }
    if ctx.view.recent.is_empty() {
        lines.push(Line::styled(
            "No votes yet",
            Style::default().fg(theme::DIM),
        ));
    }
    lines.push(Line::from(""));
    push_inline(&mut lines, ctx.view);
    lines.push(Line::styled("Esc back", Style::default().fg(theme::DIM)));

    let height = (ctx.view.recent.len() as u16).saturating_add(6).max(10);
    let panel = centered_rect(area, 64, height);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("LATEST VOTES")),
        panel,
    );
}

// ============================================
// Overlays
// ============================================

fn render_toast(frame: &mut Frame, area: Rect, toast: &famstar_core::ToastSpec) {
    if area.height < 5 || area.width < 12 {
        return;
    }
    let text = format!("{} {} · {}", toast.icon, toast.title, toast.message);
    let width = (text.width() as u16 + 4).min(area.width);
    let rect = Rect::new(area.width.saturating_sub(width + 1), 1, width, 3);

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::styled(
            text,
            Style::default().fg(theme::FAMSTAR_PINK),
        ))
        .alignment(Alignment::Center)
        .block(bordered("")),
        rect,
    );
}

fn render_modal(frame: &mut Frame, area: Rect, modal: &crate::view::ModalState) {
    let spec = &modal.spec;
    let inner_width = 46usize;
    let mut lines = vec![
        Line::from(""),
        Line::styled(
            format!("{} {}", spec.icon, spec.title),
            Style::default()
                .fg(theme::FAMSTAR_PINK)
                .add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
    ];
    for wrapped in textwrap::wrap(&spec.message, inner_width) {
        lines.push(Line::from(wrapped.to_string()));
    }
    lines.push(Line::from(""));

    let mut buttons = Vec::new();
    for (i, action) in spec.actions.iter().enumerate() {
        let selected = i == modal.selected;
        let mut style = match action.style {
            ButtonStyle::Primary => Style::default().fg(theme::FAMSTAR_PINK),
            ButtonStyle::Secondary => Style::default().fg(theme::DIM),
        };
        if selected {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        buttons.push(Span::styled(format!("[ {} ]", action.label), style));
        buttons.push(Span::raw("  "));
    }
    lines.push(Line::from(buttons));

    let height = lines.len() as u16 + 2;
    let rect = centered_rect(area, inner_width as u16 + 6, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(bordered("")),
        rect,
    );
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let rect = centered_rect(area, 20, 3);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::styled(
            "Loading...",
            Style::default().fg(theme::FAMSTAR_PINK),
        ))
        .alignment(Alignment::Center)
        .block(bordered("")),
        rect,
    );
}

// ============================================
// Helpers
// ============================================

fn bordered(title: &str) -> Block<'_> {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::DIM));
    if title.is_empty() {
        block
    } else {
        block
            .title(format!(" {title} "))
            .title_style(Style::default().fg(theme::FAMSTAR_PINK))
    }
}

fn mask(input: &str) -> String {
    "•".repeat(input.chars().count())
}

fn push_inline(lines: &mut Vec<Line<'static>>, view: &ViewState) {
    if let Some(inline) = view.inline_for_screen() {
        let color = match inline.kind {
            InlineKind::Error => theme::ERROR_RED,
            InlineKind::Notice => theme::NOTICE_GREEN,
        };
        lines.push(Line::styled(
            inline.message.clone(),
            Style::default().fg(color),
        ));
        lines.push(Line::from(""));
    }
}

/// A rect of at most `width x height`, centered in `area`.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 30, 10);
        let rect = centered_rect(area, 100, 100);
        assert_eq!(rect, area);

        let small = centered_rect(area, 10, 4);
        assert_eq!(small, Rect::new(10, 3, 10, 4));
    }

    #[test]
    fn test_mask_hides_every_char() {
        assert_eq!(mask("secret"), "••••••");
        assert_eq!(mask(""), "");
    }
}
