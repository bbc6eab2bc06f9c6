//! Particle Rain
//!
//! A timed rain of themed glyphs: particles spawn staggered above the
//! visible area, fall with constant velocity and a slight horizontal
//! drift, fade in as they enter, and are removed once they exit below.
//! The rain is finished when nothing is falling and nothing is left to
//! spawn; the surface's redraw loop stops ticking it then.
//!
//! Units are surface cells; velocities are expressed per reference
//! frame (16ms) and scaled by the elapsed delta so the motion is
//! frame-rate independent.

use std::time::Duration;

use rand::Rng;

use crate::feedback::{RainSpec, RainTheme};

/// Interval between staggered particle spawns.
const SPAWN_INTERVAL_MS: f32 = 50.0;

/// Reference frame length the velocities are tuned for.
const FRAME_MS: f32 = 16.0;

/// Opacity gained per reference frame while fading in.
const FADE_STEP: f32 = 0.05;

/// How far below the bottom edge a particle may travel before removal.
const EXIT_MARGIN: f32 = 2.0;

/// One falling glyph.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Horizontal position in cells.
    pub x: f32,
    /// Vertical position in cells (grows downward).
    pub y: f32,
    /// Horizontal drift per reference frame.
    pub vx: f32,
    /// Fall speed per reference frame.
    pub vy: f32,
    /// Render opacity, ramps 0.0 -> 1.0 after spawn.
    pub opacity: f32,
}

impl Particle {
    fn spawn<R: Rng + ?Sized>(width: f32, rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: -rng.gen_range(1.0..5.0),
            vx: rng.gen_range(-0.08..0.08),
            vy: rng.gen_range(0.2..0.5),
            opacity: 0.0,
        }
    }

    /// Integrate one step of `frames` reference frames. Returns false
    /// once the particle has left the visible area downward.
    fn update(&mut self, frames: f32, height: f32) -> bool {
        self.x += self.vx * frames;
        self.y += self.vy * frames;
        if self.opacity < 1.0 {
            self.opacity = (self.opacity + FADE_STEP * frames).min(1.0);
        }
        self.y <= height + EXIT_MARGIN
    }
}

/// An active particle rain over a surface of `width x height` cells.
#[derive(Clone, Debug)]
pub struct ParticleRain {
    theme: RainTheme,
    width: f32,
    height: f32,
    particles: Vec<Particle>,
    pending: usize,
    spawn_accum_ms: f32,
}

impl ParticleRain {
    /// Schedule a rain of `spec.count` particles over the given area.
    pub fn new(spec: RainSpec, width: f32, height: f32) -> Self {
        Self {
            theme: spec.theme,
            width,
            height,
            particles: Vec::with_capacity(spec.count),
            pending: spec.count,
            spawn_accum_ms: SPAWN_INTERVAL_MS, // first particle spawns on the first tick
        }
    }

    /// The glyph theme.
    pub fn theme(&self) -> RainTheme {
        self.theme
    }

    /// The currently falling particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Whether the rain has drained: nothing falling, nothing pending.
    pub fn is_finished(&self) -> bool {
        self.particles.is_empty() && self.pending == 0
    }

    /// Adapt to a resized surface.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Advance the rain by `delta`. Spawns pending particles at the
    /// stagger interval, integrates positions, drops exited particles.
    /// Returns `true` while the rain is still active; once it returns
    /// `false` the caller can stop scheduling ticks.
    pub fn tick<R: Rng + ?Sized>(&mut self, delta: Duration, rng: &mut R) -> bool {
        let delta_ms = delta.as_secs_f32() * 1000.0;

        if self.pending > 0 {
            self.spawn_accum_ms += delta_ms;
            while self.spawn_accum_ms >= SPAWN_INTERVAL_MS && self.pending > 0 {
                self.spawn_accum_ms -= SPAWN_INTERVAL_MS;
                self.particles.push(Particle::spawn(self.width, rng));
                self.pending -= 1;
            }
        }

        let frames = delta_ms / FRAME_MS;
        let height = self.height;
        self.particles.retain_mut(|p| p.update(frames, height));

        !self.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spec(count: usize) -> RainSpec {
        RainSpec {
            theme: RainTheme::Confetti,
            count,
        }
    }

    #[test]
    fn test_spawns_are_staggered() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut rain = ParticleRain::new(spec(10), 80.0, 24.0);

        rain.tick(Duration::from_millis(50), &mut rng);
        let after_one = rain.particles().len();
        assert!(after_one >= 1 && after_one < 10, "got {after_one}");

        rain.tick(Duration::from_millis(200), &mut rng);
        assert!(rain.particles().len() > after_one);
    }

    #[test]
    fn test_rain_drains_to_zero_and_stops() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut rain = ParticleRain::new(spec(25), 80.0, 24.0);

        // Generous upper bound; the rain must quiesce well before it.
        let mut ticks = 0;
        while rain.tick(Duration::from_millis(33), &mut rng) {
            ticks += 1;
            assert!(ticks < 20_000, "rain never drained");
        }

        assert!(rain.is_finished());
        assert_eq!(rain.particles().len(), 0);
        // Once finished, further ticks stay inert.
        assert!(!rain.tick(Duration::from_millis(33), &mut rng));
    }

    #[test]
    fn test_opacity_ramps_in() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut rain = ParticleRain::new(spec(1), 80.0, 240.0);

        rain.tick(Duration::from_millis(50), &mut rng);
        let first = rain.particles()[0].opacity;
        rain.tick(Duration::from_millis(50), &mut rng);
        let second = rain.particles()[0].opacity;
        assert!(second > first);
        assert!(second <= 1.0);
    }

    #[test]
    fn test_particles_fall_downward() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut rain = ParticleRain::new(spec(1), 80.0, 240.0);

        rain.tick(Duration::from_millis(50), &mut rng);
        let y0 = rain.particles()[0].y;
        rain.tick(Duration::from_millis(100), &mut rng);
        let y1 = rain.particles()[0].y;
        assert!(y1 > y0);
    }

    #[test]
    fn test_empty_spec_is_immediately_finished() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut rain = ParticleRain::new(spec(0), 80.0, 24.0);
        assert!(rain.is_finished());
        assert!(!rain.tick(Duration::from_millis(16), &mut rng));
    }
}
