//! Tone Playback
//!
//! Performs the core's tone specs. With the `audio` feature the notes
//! are synthesized through the default output device; without it a
//! silent voice stands in so the timing and lifecycle behave the same
//! everywhere.
//!
//! At most one long-running voice exists at a time: starting a new
//! tone silences and releases the previous voice before the new one
//! begins.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use famstar_core::ToneSpec;

/// Plays tone specs, owning the single active voice.
pub struct TonePlayer {
    current: Option<Voice>,
    active_count: Arc<AtomicUsize>,
}

impl TonePlayer {
    /// A player with no active voice.
    pub fn new() -> Self {
        Self {
            current: None,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start playing a tone. Any previous voice is silenced and
    /// released first.
    pub fn play(&mut self, spec: &ToneSpec) {
        self.current = None;
        self.current = Some(Voice::start(spec, Arc::clone(&self.active_count)));
    }

    /// Release the voice once its tone has finished sounding. Called
    /// from the frame loop.
    pub fn tick(&mut self) {
        if let Some(voice) = &self.current {
            if voice.is_finished() {
                self.current = None;
            }
        }
    }

    /// Stop whatever is playing.
    pub fn silence(&mut self) {
        self.current = None;
    }

    /// How many voices exist right now (0 or 1).
    pub fn active_voices(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }
}

impl Default for TonePlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// One sounding tone. Dropping it stops the sound.
struct Voice {
    started: Instant,
    total: Duration,
    counter: Arc<AtomicUsize>,
    _backend: VoiceBackend,
}

enum VoiceBackend {
    /// No device output; the voice only tracks timing.
    Silent,
    /// A live output stream. Dropping it stops playback.
    #[cfg(feature = "audio")]
    Stream(cpal::Stream),
}

impl Voice {
    fn start(spec: &ToneSpec, counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        let backend = Self::open_backend(spec);
        Self {
            started: Instant::now(),
            total: Duration::from_millis(u64::from(spec.total_ms())),
            counter,
            _backend: backend,
        }
    }

    fn is_finished(&self) -> bool {
        self.started.elapsed() >= self.total
    }

    #[cfg(feature = "audio")]
    fn open_backend(spec: &ToneSpec) -> VoiceBackend {
        match synth::open_stream(spec) {
            Ok(stream) => VoiceBackend::Stream(stream),
            Err(err) => {
                tracing::warn!("audio output unavailable, playing silently: {err}");
                VoiceBackend::Silent
            }
        }
    }

    #[cfg(not(feature = "audio"))]
    fn open_backend(_spec: &ToneSpec) -> VoiceBackend {
        VoiceBackend::Silent
    }
}

impl Drop for Voice {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(feature = "audio")]
mod synth {
    //! Sample synthesis for the optional audio backend.

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use famstar_core::{ToneSpec, Waveform};

    /// Peak amplitude; low enough to be friendly at default volume.
    const AMPLITUDE: f32 = 0.2;

    /// Attack/release ramp applied to each note to avoid clicks.
    const RAMP_S: f32 = 0.005;

    struct ScheduledNote {
        freq_hz: f32,
        start_s: f32,
        end_s: f32,
    }

    pub(super) fn open_stream(spec: &ToneSpec) -> anyhow::Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no output device"))?;
        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let waveform = spec.waveform;
        let notes: Vec<ScheduledNote> = spec
            .notes
            .iter()
            .map(|n| ScheduledNote {
                freq_hz: n.freq_hz,
                start_s: n.start_ms as f32 / 1000.0,
                end_s: (n.start_ms + n.duration_ms) as f32 / 1000.0,
            })
            .collect();

        let mut clock: u64 = 0;
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                for frame in data.chunks_mut(channels) {
                    let t = clock as f32 / sample_rate;
                    clock += 1;
                    let sample = mix(&notes, waveform, t);
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            |err| tracing::warn!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;
        Ok(stream)
    }

    fn mix(notes: &[ScheduledNote], waveform: Waveform, t: f32) -> f32 {
        let mut sample = 0.0;
        for note in notes {
            if t < note.start_s || t >= note.end_s {
                continue;
            }
            let local = t - note.start_s;
            let remaining = note.end_s - t;
            let envelope = (local / RAMP_S).min(1.0).min((remaining / RAMP_S).min(1.0));
            sample += oscillator(waveform, note.freq_hz, t) * envelope;
        }
        (sample * AMPLITUDE).clamp(-1.0, 1.0)
    }

    fn oscillator(waveform: Waveform, freq_hz: f32, t: f32) -> f32 {
        let phase = (t * freq_hz).fract();
        match waveform {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use famstar_core::{Rating, FeedbackProfile};

    fn tone(rating: u8) -> ToneSpec {
        FeedbackProfile::for_rating(Rating::new(rating).unwrap()).tone
    }

    #[test]
    fn test_one_voice_after_rapid_replays() {
        let mut player = TonePlayer::new();
        player.play(&tone(5));
        player.play(&tone(5));
        assert_eq!(player.active_voices(), 1);
    }

    #[test]
    fn test_voice_released_after_tone_ends() {
        let mut player = TonePlayer::new();
        player.play(&tone(3)); // 100ms neutral tone
        assert_eq!(player.active_voices(), 1);

        std::thread::sleep(Duration::from_millis(150));
        player.tick();
        assert_eq!(player.active_voices(), 0);
    }

    #[test]
    fn test_silence_releases_immediately() {
        let mut player = TonePlayer::new();
        player.play(&tone(1));
        player.silence();
        assert_eq!(player.active_voices(), 0);
    }

    #[test]
    fn test_tick_keeps_running_voice() {
        let mut player = TonePlayer::new();
        player.play(&tone(1)); // 500ms drone
        player.tick();
        assert_eq!(player.active_voices(), 1);
    }
}
