//! Theme
//!
//! The famstar palette and the glyph mapping for particle rains.

use famstar_core::RainTheme;
use ratatui::style::Color;

/// Brand accent used for titles and highlights.
pub const FAMSTAR_PINK: Color = Color::Rgb(255, 105, 180);

/// First-place gold.
pub const GOLD: Color = Color::Rgb(255, 215, 0);

/// Second-place silver.
pub const SILVER: Color = Color::Rgb(192, 192, 192);

/// Third-place bronze.
pub const BRONZE: Color = Color::Rgb(205, 127, 50);

/// Inline error text.
pub const ERROR_RED: Color = Color::Rgb(255, 85, 85);

/// Inline notice text.
pub const NOTICE_GREEN: Color = Color::Rgb(80, 200, 120);

/// De-emphasized chrome (hints, separators).
pub const DIM: Color = Color::DarkGray;

/// A selected/filled star.
pub const STAR_FILLED: char = '★';

/// An unselected star.
pub const STAR_EMPTY: char = '☆';

/// Glyph and color for a rain theme.
pub fn rain_appearance(theme: RainTheme) -> (char, Color) {
    match theme {
        RainTheme::Crown => ('♛', GOLD),
        RainTheme::Confetti => ('★', FAMSTAR_PINK),
        RainTheme::Poop => ('●', Color::Rgb(139, 90, 43)),
    }
}

/// Dimmed variant of a rain color while a particle fades in.
pub fn faded(color: Color) -> Color {
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(r / 2, g / 2, b / 2),
        other => other,
    }
}
