//! A single subtractive voice.

use delegate::delegate;

use super::envelope::{Adsr, AdsrStage};
use super::ladder::LadderLowPass;
use super::note::note_to_frequency;
use super::wavetable::{Waveform, Wavetable, DEFAULT_TABLE_SIZE};
use super::{SignalProcessor, SignalSource};
use crate::error::Error;

const LFO_TABLE_SIZE: usize = 256;

/// Oscillator into envelope into ladder low-pass, with a vibrato and a
/// tremolo LFO.
///
/// # Example
///
/// ```
/// use klangwerk::dsp::{Instrument, SignalSource};
///
/// let mut voice = Instrument::new(44_100.0).unwrap();
/// voice.set_vibrato(5.0, 3.0);
/// voice.note_on(57, 100);
/// let mut block = [0.0f32; 256];
/// voice.out(&mut block);
/// voice.note_off();
/// ```
#[derive(Clone, Debug)]
pub struct Instrument {
    oscillator: Wavetable,
    envelope: Adsr,
    filter: LadderLowPass,
    vibrato: Wavetable,
    vibrato_depth: f32,
    tremolo: Wavetable,
    tremolo_depth: f32,
    base_frequency: f32,
    velocity: f32,
    note: Option<u8>,
}

impl Instrument {
    /// Fails when `sample_rate` is not a positive finite number.
    pub fn new(sample_rate: f32) -> Result<Self, Error> {
        let filter = LadderLowPass::new(sample_rate * 0.45, 0.0, sample_rate)?;
        let mut oscillator = Wavetable::new(Waveform::Sine, DEFAULT_TABLE_SIZE, sample_rate);
        oscillator.interpolate_samples(true);
        oscillator.set_amplitude(0.75);
        let base_frequency = oscillator.frequency();

        let mut vibrato = Wavetable::new(Waveform::Sine, LFO_TABLE_SIZE, sample_rate);
        vibrato.set_frequency(5.0);
        let mut tremolo = Wavetable::new(Waveform::Sine, LFO_TABLE_SIZE, sample_rate);
        tremolo.set_frequency(5.0);

        Ok(Self {
            oscillator,
            envelope: Adsr::new(sample_rate),
            filter,
            vibrato,
            vibrato_depth: 0.0,
            tremolo,
            tremolo_depth: 0.0,
            base_frequency,
            velocity: 0.0,
            note: None,
        })
    }

    delegate! {
        to self.envelope {
            pub fn set_attack(&mut self, seconds: f32);
            pub fn set_decay(&mut self, seconds: f32);
            pub fn set_sustain(&mut self, level: f32);
            pub fn set_release(&mut self, seconds: f32);
            pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32);
            #[call(is_active)]
            pub fn is_playing(&self) -> bool;
            #[call(stage)]
            pub fn envelope_stage(&self) -> AdsrStage;
        }
        to self.filter {
            #[call(set_frequency)]
            pub fn set_filter_frequency(&mut self, frequency: f32);
            #[call(set_resonance)]
            pub fn set_filter_resonance(&mut self, resonance: f32);
        }
        to self.oscillator {
            #[call(set_waveform)]
            pub fn set_oscillator_type(&mut self, waveform: Waveform);
            /// Overall gain applied on top of velocity.
            pub fn set_amplitude(&mut self, amplitude: f32);
            /// Glide the gain to `amplitude` over `samples` sounding samples.
            #[call(set_amplitude_ramped)]
            pub fn ramp_amplitude(&mut self, amplitude: f32, samples: u32);
            pub fn amplitude(&self) -> f32;
        }
    }

    /// Pitch of the current note without vibrato.
    pub fn frequency(&self) -> f32 {
        self.base_frequency
    }

    /// Sweep the pitch by `depth` Hz either side of the note, `rate` times a
    /// second. A depth of zero turns vibrato off.
    pub fn set_vibrato(&mut self, rate: f32, depth: f32) {
        self.vibrato.set_frequency(rate);
        if !depth.is_nan() {
            self.vibrato_depth = depth.abs();
        }
        if self.vibrato_depth == 0.0 {
            self.oscillator.set_frequency(self.base_frequency);
        }
    }

    /// Dip the gain by up to `depth` (0..=1), `rate` times a second. A depth
    /// of zero turns tremolo off.
    pub fn set_tremolo(&mut self, rate: f32, depth: f32) {
        self.tremolo.set_frequency(rate);
        if !depth.is_nan() {
            self.tremolo_depth = depth.clamp(0.0, 1.0);
        }
    }

    /// Start `note` at `velocity` (0..=127). Retriggers if already playing.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.note = Some(note);
        self.velocity = f32::from(velocity.min(127)) / 127.0;
        self.base_frequency = note_to_frequency(f32::from(note));
        self.oscillator.set_frequency(self.base_frequency);
        self.envelope.start();
    }

    pub fn note_off(&mut self) {
        self.note = None;
        self.envelope.stop();
    }

    /// The note held since the last `note_on`, if any.
    pub fn note(&self) -> Option<u8> {
        self.note
    }

    /// Silence now and clear the filter.
    pub fn reset(&mut self) {
        self.note = None;
        self.envelope.reset();
        self.filter.cleanup();
        self.oscillator.reset();
        self.vibrato.reset();
        self.tremolo.reset();
    }
}

impl SignalSource for Instrument {
    fn output(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        if self.vibrato_depth > 0.0 {
            let deviation = self.vibrato.output() * self.vibrato_depth;
            self.oscillator.set_frequency(self.base_frequency + deviation);
        }
        let mut tone = self.oscillator.output() * self.velocity;
        if self.tremolo_depth > 0.0 {
            // LFO mapped to 0..=1, so the gain stays within [1 - depth, 1]
            let lfo = 0.5 + 0.5 * self.tremolo.output();
            tone *= 1.0 - self.tremolo_depth * lfo;
        }
        let shaped = self.envelope.process(tone);
        self.filter.process(shaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn silent_until_note_on() {
        let mut voice = Instrument::new(44_100.0).unwrap();
        assert!(!voice.is_playing());
        assert_eq!(voice.output(), 0.0);
    }

    #[test]
    fn note_on_sets_pitch_and_plays() {
        let mut voice = Instrument::new(44_100.0).unwrap();
        voice.set_adsr(0.0, 0.0, 1.0, 0.01);
        voice.note_on(69, 127);
        assert_eq!(voice.frequency(), 440.0);
        assert_eq!(voice.note(), Some(69));
        let peak = (0..1000).map(|_| voice.output().abs()).fold(0.0, f32::max);
        assert!(peak > 0.3, "peak {peak}");
    }

    #[test]
    fn note_off_releases_to_silence() {
        let mut voice = Instrument::new(1000.0).unwrap();
        voice.set_adsr(0.0, 0.0, 1.0, 0.01);
        voice.note_on(60, 100);
        voice.output();
        voice.note_off();
        for _ in 0..20 {
            voice.output();
        }
        assert_eq!(voice.envelope_stage(), AdsrStage::Idle);
        assert_eq!(voice.output(), 0.0);
    }

    #[test]
    fn rejects_unusable_sample_rate() {
        assert!(matches!(
            Instrument::new(0.0),
            Err(Error::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn ramped_amplitude_glides_while_sounding() {
        let mut voice = Instrument::new(1000.0).unwrap();
        voice.set_adsr(0.0, 0.0, 1.0, 0.1);
        voice.note_on(60, 127);
        assert_eq!(voice.amplitude(), 0.75);

        voice.ramp_amplitude(0.25, 100);
        voice.output();
        assert_abs_diff_eq!(voice.amplitude(), 0.745, epsilon = 1e-5);
        for _ in 0..49 {
            voice.output();
        }
        assert_abs_diff_eq!(voice.amplitude(), 0.5, epsilon = 1e-4);
        for _ in 0..50 {
            voice.output();
        }
        assert_eq!(voice.amplitude(), 0.25);
    }

    #[test]
    fn vibrato_bends_the_pitch_around_the_note() {
        let mut voice = Instrument::new(44_100.0).unwrap();
        voice.set_adsr(0.0, 0.0, 1.0, 0.1);
        voice.set_vibrato(10.0, 20.0);
        voice.note_on(69, 127);

        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        // one full LFO period
        for _ in 0..4410 {
            voice.output();
            let f = voice.oscillator.frequency();
            lowest = lowest.min(f);
            highest = highest.max(f);
        }
        assert_eq!(voice.frequency(), 440.0);
        assert!(lowest < 425.0 && lowest >= 420.0, "lowest {lowest}");
        assert!(highest > 455.0 && highest <= 460.0, "highest {highest}");

        voice.set_vibrato(10.0, 0.0);
        voice.output();
        assert_eq!(voice.oscillator.frequency(), 440.0);
    }

    #[test]
    fn tremolo_dips_the_level() {
        let mut steady = Instrument::new(44_100.0).unwrap();
        let mut shaky = steady.clone();
        shaky.set_tremolo(4.0, 1.0);
        for voice in [&mut steady, &mut shaky] {
            voice.set_adsr(0.0, 0.0, 1.0, 0.1);
            voice.set_filter_frequency(15_000.0);
            voice.note_on(81, 127);
        }

        let energy = |voice: &mut Instrument| -> f32 {
            (0..11_025).map(|_| voice.output().powi(2)).sum()
        };
        let full = energy(&mut steady);
        let dipped = energy(&mut shaky);
        assert!(dipped < full * 0.8, "{dipped} vs {full}");
        assert!(dipped > 0.0);
    }
}
