//! Rating Feedback Profiles
//!
//! Each rating value maps to a feedback profile: a short tone (or a
//! melodic run for the extremes), a haptic pulse pattern, and for the
//! extremes a themed particle rain. The profiles are pure data; the
//! surface decides how to perform them (audio device, terminal bell,
//! rendered glyph rain).

use serde::{Deserialize, Serialize};

use crate::ranking::RankPosition;
use crate::votes::Rating;

// Note frequencies, equal temperament, A4 = 440 Hz.
const C2: f32 = 65.41;
const C3: f32 = 130.81;
const E4: f32 = 329.63;
const G4: f32 = 392.00;
const C5: f32 = 523.25;
const E5: f32 = 659.25;
const G5: f32 = 783.99;
const C6: f32 = 1046.50;

/// Scale used for the neutral ratings, indexed by `rating - 1`.
const NEUTRAL_SCALE: [f32; 5] = [C3, E4, G4, C5, E5];

/// Oscillator shape for a tone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    /// Smooth sine.
    Sine,
    /// Hollow square.
    Square,
    /// Buzzy sawtooth.
    Sawtooth,
}

/// One scheduled note within a tone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Pitch in Hz.
    pub freq_hz: f32,
    /// Offset from the start of the tone.
    pub start_ms: u32,
    /// How long the note sounds.
    pub duration_ms: u32,
}

/// A short audio tone or melodic run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    /// Oscillator shape for every note.
    pub waveform: Waveform,
    /// The scheduled notes, in start order.
    pub notes: Vec<Note>,
}

impl ToneSpec {
    /// A single note starting immediately.
    pub fn single(waveform: Waveform, freq_hz: f32, duration_ms: u32) -> Self {
        Self {
            waveform,
            notes: vec![Note {
                freq_hz,
                start_ms: 0,
                duration_ms,
            }],
        }
    }

    /// Total length of the tone from start to the last note's end.
    pub fn total_ms(&self) -> u32 {
        self.notes
            .iter()
            .map(|n| n.start_ms + n.duration_ms)
            .max()
            .unwrap_or(0)
    }
}

/// The two glyph themes a particle rain can use, plus the crown used
/// for the first-place home entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RainTheme {
    /// First-place celebration.
    Crown,
    /// Top-rating celebration.
    Confetti,
    /// Bottom-rating mockery.
    Poop,
}

/// Parameters for a timed particle-rain animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainSpec {
    /// Which glyph theme to rain.
    pub theme: RainTheme,
    /// How many particles to schedule.
    pub count: usize,
}

/// The full feedback bundle for one rating value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackProfile {
    /// The tone to play.
    pub tone: ToneSpec,
    /// Vibration pulse pattern in milliseconds (pulse, pause, ...).
    pub haptic: Vec<u32>,
    /// Particle rain for the extreme ratings, `None` otherwise.
    pub rain: Option<RainSpec>,
}

impl FeedbackProfile {
    /// The feedback profile keyed by rating value.
    ///
    /// 1 is the negative profile (low sawtooth drone, heavy pulse,
    /// poop rain), 5 the positive one (ascending square run, light
    /// pulse pair, confetti rain), and 2-4 a neutral short tone scaled
    /// by value.
    pub fn for_rating(rating: Rating) -> Self {
        if rating.is_lowest() {
            return Self {
                tone: ToneSpec::single(Waveform::Sawtooth, C2, 500),
                haptic: vec![100, 50, 100, 50, 150],
                rain: Some(RainSpec {
                    theme: RainTheme::Poop,
                    count: 30,
                }),
            };
        }

        if rating.is_highest() {
            let run = [E4, G4, C5, E5, G5, C6];
            let notes = run
                .iter()
                .enumerate()
                .map(|(i, &freq_hz)| Note {
                    freq_hz,
                    start_ms: i as u32 * 80,
                    duration_ms: 80,
                })
                .collect();
            return Self {
                tone: ToneSpec {
                    waveform: Waveform::Square,
                    notes,
                },
                haptic: vec![50, 30, 50, 30, 100],
                rain: Some(RainSpec {
                    theme: RainTheme::Confetti,
                    count: 40,
                }),
            };
        }

        Self {
            tone: ToneSpec::single(
                Waveform::Square,
                NEUTRAL_SCALE[(rating.value() - 1) as usize],
                100,
            ),
            haptic: vec![30],
            rain: None,
        }
    }

    /// Success pulse played after a vote is recorded, independent of
    /// the rating value.
    pub fn success_haptic() -> Vec<u32> {
        vec![100, 50, 100]
    }
}

/// The particle rain greeting a user on home entry, if their ranking
/// position earns one: a crown for first place, poop for last.
pub fn rain_for_position(position: RankPosition) -> Option<RainSpec> {
    if position.rank == 1 {
        Some(RainSpec {
            theme: RainTheme::Crown,
            count: 25,
        })
    } else if position.is_last {
        Some(RainSpec {
            theme: RainTheme::Poop,
            count: 20,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(v: u8) -> Rating {
        Rating::new(v).unwrap()
    }

    #[test]
    fn test_lowest_rating_profile() {
        let p = FeedbackProfile::for_rating(rating(1));
        assert_eq!(p.tone.waveform, Waveform::Sawtooth);
        assert_eq!(p.tone.notes.len(), 1);
        assert_eq!(p.tone.total_ms(), 500);
        assert_eq!(p.rain.unwrap().theme, RainTheme::Poop);
        assert_eq!(p.haptic.len(), 5);
    }

    #[test]
    fn test_highest_rating_profile() {
        let p = FeedbackProfile::for_rating(rating(5));
        assert_eq!(p.tone.waveform, Waveform::Square);
        assert_eq!(p.tone.notes.len(), 6);
        // Six 80ms steps: the run ends at 480ms.
        assert_eq!(p.tone.total_ms(), 480);
        // Ascending run.
        for pair in p.tone.notes.windows(2) {
            assert!(pair[1].freq_hz > pair[0].freq_hz);
            assert!(pair[1].start_ms > pair[0].start_ms);
        }
        assert_eq!(p.rain.unwrap().theme, RainTheme::Confetti);
    }

    #[test]
    fn test_neutral_ratings_scale_by_value() {
        let freqs: Vec<f32> = (2..=4)
            .map(|v| FeedbackProfile::for_rating(rating(v)).tone.notes[0].freq_hz)
            .collect();
        assert!(freqs[0] < freqs[1] && freqs[1] < freqs[2]);
        for v in 2..=4 {
            let p = FeedbackProfile::for_rating(rating(v));
            assert!(p.rain.is_none());
            assert_eq!(p.haptic, vec![30]);
            assert_eq!(p.tone.total_ms(), 100);
        }
    }

    #[test]
    fn test_rain_for_position() {
        let first = RankPosition {
            rank: 1,
            is_last: false,
            total: 5,
        };
        let last = RankPosition {
            rank: 5,
            is_last: true,
            total: 5,
        };
        let mid = RankPosition {
            rank: 3,
            is_last: false,
            total: 5,
        };
        assert_eq!(rain_for_position(first).unwrap().theme, RainTheme::Crown);
        assert_eq!(rain_for_position(last).unwrap().theme, RainTheme::Poop);
        assert!(rain_for_position(mid).is_none());
    }

    #[test]
    fn test_sole_member_is_both_first_and_last() {
        // A single ranked profile is rank 1 and last at once; the
        // crown wins.
        let only = RankPosition {
            rank: 1,
            is_last: true,
            total: 1,
        };
        assert_eq!(rain_for_position(only).unwrap().theme, RainTheme::Crown);
    }
}
