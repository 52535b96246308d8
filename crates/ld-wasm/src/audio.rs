// ============================================================================
// Web Audio cue synthesis
// Every cue is a handful of short oscillator voices; nothing is sampled.
// ============================================================================

use std::cell::RefCell;

use web_sys::{AudioContext, AudioContextState, BiquadFilterType, OscillatorType};

use ld_draw::{Cue, RandomSource, SoundPlayer};

use crate::random::MathRandom;

/// Envelope floor; exponential ramps cannot reach zero
const SILENCE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    fn oscillator_type(self) -> OscillatorType {
        match self {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    Lowpass { cutoff_hz: f32, q: Option<f32> },
    Highpass { cutoff_hz: f32 },
}

/// One oscillator note
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// Start time relative to the cue
    pub offset_s: f64,
    pub waveform: Waveform,
    pub start_hz: f32,
    /// Exponential frequency ramps as (target Hz, seconds after start)
    pub sweep: Vec<(f32, f64)>,
    pub filter: Filter,
    pub peak_gain: f32,
    pub attack_s: f64,
    pub duration_s: f64,
}

/// Voices making up `cue` at master `volume`
pub fn plan_cue(cue: Cue, volume: f32, rng: &mut dyn RandomSource) -> Vec<Voice> {
    match cue {
        Cue::Spin => vec![Voice {
            offset_s: 0.0,
            waveform: Waveform::Sawtooth,
            start_hz: 200.0,
            sweep: vec![(600.0, 0.09), (100.0, 0.3)],
            filter: Filter::Lowpass {
                cutoff_hz: 2000.0,
                q: Some(10.0),
            },
            peak_gain: volume * 0.8,
            attack_s: 0.01,
            duration_s: 0.3,
        }],
        Cue::Win => [523.25, 659.25, 783.99, 1046.50]
            .iter()
            .enumerate()
            .map(|(i, &hz)| Voice {
                offset_s: i as f64 * 0.2,
                waveform: Waveform::Triangle,
                start_hz: hz,
                sweep: Vec::new(),
                filter: Filter::Lowpass {
                    cutoff_hz: 3000.0,
                    q: None,
                },
                peak_gain: volume * 0.6,
                attack_s: 0.1,
                duration_s: 0.8,
            })
            .collect(),
        Cue::Click => vec![Voice {
            offset_s: 0.0,
            waveform: Waveform::Square,
            start_hz: 1200.0,
            sweep: Vec::new(),
            filter: Filter::Highpass { cutoff_hz: 1000.0 },
            peak_gain: volume * 0.3,
            attack_s: 0.01,
            duration_s: 0.1,
        }],
        Cue::Celebration => (0..5)
            .map(|i| Voice {
                offset_s: i as f64 * 0.05,
                waveform: Waveform::Sawtooth,
                start_hz: 200.0 + rng.next_f64() as f32 * 800.0,
                sweep: Vec::new(),
                filter: Filter::Lowpass {
                    cutoff_hz: 4000.0,
                    q: None,
                },
                peak_gain: volume * 0.4,
                attack_s: 0.05,
                duration_s: 0.3,
            })
            .collect(),
    }
}

// ============================================================================
// PLAYER
// ============================================================================

/// Plays cues through a lazily created `AudioContext`
pub struct WebAudioSoundPlayer {
    context: RefCell<Option<AudioContext>>,
    volume: f32,
    rng: RefCell<MathRandom>,
}

impl WebAudioSoundPlayer {
    pub fn new(volume: f32) -> Self {
        Self {
            context: RefCell::new(None),
            volume: volume.clamp(0.0, 1.0),
            rng: RefCell::new(MathRandom),
        }
    }

    /// Browsers only allow audio after a user gesture, so the context is made
    /// on first use and resumed if it was suspended.
    fn context(&self) -> Result<AudioContext, wasm_bindgen::JsValue> {
        let mut slot = self.context.borrow_mut();
        let ctx = match slot.as_ref() {
            Some(ctx) => ctx.clone(),
            None => {
                let ctx = AudioContext::new()?;
                log::info!("[LuckyDraw] Audio context created");
                *slot = Some(ctx.clone());
                ctx
            }
        };
        if ctx.state() == AudioContextState::Suspended {
            let _ = ctx.resume()?;
        }
        Ok(ctx)
    }

    fn play_voice(&self, ctx: &AudioContext, voice: &Voice) -> Result<(), wasm_bindgen::JsValue> {
        let start = ctx.current_time() + voice.offset_s;
        let end = start + voice.duration_s;

        let osc = ctx.create_oscillator()?;
        let filter = ctx.create_biquad_filter()?;
        let gain = ctx.create_gain()?;

        osc.connect_with_audio_node(&filter)?;
        filter.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&ctx.destination())?;

        match voice.filter {
            Filter::Lowpass { cutoff_hz, q } => {
                filter.set_type(BiquadFilterType::Lowpass);
                filter.frequency().set_value_at_time(cutoff_hz, start)?;
                if let Some(q) = q {
                    filter.q().set_value_at_time(q, start)?;
                }
            }
            Filter::Highpass { cutoff_hz } => {
                filter.set_type(BiquadFilterType::Highpass);
                filter.frequency().set_value_at_time(cutoff_hz, start)?;
            }
        }

        osc.set_type(voice.waveform.oscillator_type());
        let frequency = osc.frequency();
        frequency.set_value_at_time(voice.start_hz, start)?;
        for &(hz, at) in &voice.sweep {
            frequency.exponential_ramp_to_value_at_time(hz, start + at)?;
        }

        let level = gain.gain();
        level.set_value_at_time(0.0, start)?;
        level.linear_ramp_to_value_at_time(voice.peak_gain.max(SILENCE), start + voice.attack_s)?;
        level.exponential_ramp_to_value_at_time(SILENCE, end)?;

        osc.start_with_when(start)?;
        osc.stop_with_when(end)?;
        Ok(())
    }
}

impl SoundPlayer for WebAudioSoundPlayer {
    fn play_cue(&self, cue: Cue) {
        let ctx = match self.context() {
            Ok(ctx) => ctx,
            Err(e) => {
                log::warn!("[LuckyDraw] Audio unavailable: {:?}", e);
                return;
            }
        };

        let voices = plan_cue(cue, self.volume, &mut *self.rng.borrow_mut());
        for voice in &voices {
            if let Err(e) = self.play_voice(&ctx, voice) {
                log::warn!("[LuckyDraw] Failed to play {} cue: {:?}", cue.name(), e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ld_draw::ScriptedRandom;

    #[test]
    fn test_win_arpeggio() {
        let voices = plan_cue(Cue::Win, 0.5, &mut ScriptedRandom::constant(0.0));
        assert_eq!(voices.len(), 4);
        assert!((voices[3].offset_s - 0.6).abs() < 1e-9);
        assert!((voices[0].peak_gain - 0.3).abs() < 1e-6);
        assert!(voices.iter().all(|v| v.waveform == Waveform::Triangle));
    }

    #[test]
    fn test_spin_sweep() {
        let voices = plan_cue(Cue::Spin, 1.0, &mut ScriptedRandom::constant(0.0));
        assert_eq!(voices[0].sweep, vec![(600.0, 0.09), (100.0, 0.3)]);
        assert_eq!(
            voices[0].filter,
            Filter::Lowpass {
                cutoff_hz: 2000.0,
                q: Some(10.0)
            }
        );
    }

    #[test]
    fn test_celebration_pitch_range() {
        let mut rng = ScriptedRandom::new(vec![0.0, 0.5, 0.999]);
        let voices = plan_cue(Cue::Celebration, 0.6, &mut rng);
        assert_eq!(voices.len(), 5);
        assert!((voices[0].start_hz - 200.0).abs() < 1e-3);
        assert!((voices[1].start_hz - 600.0).abs() < 1e-3);
        assert!(voices.iter().all(|v| (200.0..1000.0).contains(&v.start_hz)));
    }
}
