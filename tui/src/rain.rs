//! Rain Rendering
//!
//! Draws the core particle field into the terminal buffer. Particles
//! above the top edge are simply not drawn yet; opacity maps to a
//! dimmed color while a particle fades in.

use famstar_core::ParticleRain;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::theme;

/// Opacity threshold below which a particle renders dimmed.
const FADE_THRESHOLD: f32 = 0.5;

/// Draw every visible particle of the rain over `area`.
pub fn render_rain(rain: &ParticleRain, area: Rect, buf: &mut Buffer) {
    let (glyph, color) = theme::rain_appearance(rain.theme());
    let mut cell = [0u8; 4];
    let glyph_str: &str = glyph.encode_utf8(&mut cell);

    for particle in rain.particles() {
        if particle.y < 0.0 {
            continue;
        }
        let x = particle.x.round();
        let y = particle.y.round();
        if x < 0.0 || x >= f32::from(area.width) || y >= f32::from(area.height) {
            continue;
        }
        let style = if particle.opacity < FADE_THRESHOLD {
            Style::default().fg(theme::faded(color))
        } else {
            Style::default().fg(color)
        };
        buf.set_string(area.x + x as u16, area.y + y as u16, glyph_str, style);
    }
}
