//! Distortion effect with named presets.
//!
//! Signal flow per sample: input gain, optional pre-filtering, waveshaping,
//! optional post-filtering, octave-up mix, left/right cross-mix, level and
//! panning, then a DC-blocking high-pass.

use crate::error::Error;

use super::filter::{AnalogFilter, FilterKind};
use super::waveshaper::{PreparedShape, ShapeKind, WaveShaper, NUM_SHAPE_KINDS};
use super::{Signal, SignalProcessor, SignalProcessorStereo};

/// Stable parameter indices for [`Distortion::change_param`] and
/// [`Distortion::get_param`].
pub mod params {
    /// Effect volume (0..=127). 0 also resets all internal state.
    pub const VOLUME: usize = 0;
    /// Output balance, 0 = left, 127 = right.
    pub const PANNING: usize = 1;
    /// Left/right cross-mix (0..=127).
    pub const LR_CROSS: usize = 2;
    /// Input gain and shaping intensity (0..=127).
    pub const DRIVE: usize = 3;
    /// Output level (0..=127, about -40 dB to +20 dB).
    pub const LEVEL: usize = 4;
    /// Waveshaper id (0..=29).
    pub const TYPE: usize = 5;
    /// Invert the input polarity (0 or 1).
    pub const NEGATE: usize = 6;
    /// Low-pass cutoff in Hz.
    pub const LPF: usize = 7;
    /// High-pass cutoff in Hz.
    pub const HPF: usize = 8;
    /// Shape both channels independently (0 or 1).
    pub const STEREO: usize = 9;
    /// Filter before shaping instead of after (0 or 1).
    pub const PREFILTERING: usize = 10;
    /// Unused, always reads 0.
    pub const RESERVED: usize = 11;
    /// Octave-up mix (0..=127).
    pub const OCTAVE: usize = 12;
}

pub const NUM_PARAMS: usize = 13;
pub const NUM_PRESETS: usize = 6;

/// A named parameter vector. Entries map onto parameter indices 0..=10.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub values: [i32; 11],
}

pub const PRESETS: [Preset; NUM_PRESETS] = [
    Preset {
        name: "Overdrive 1",
        values: [84, 64, 35, 56, 40, 0, 0, 6703, 21, 0, 0],
    },
    Preset {
        name: "Overdrive 2",
        values: [85, 64, 35, 29, 45, 1, 0, 25040, 21, 0, 0],
    },
    Preset {
        name: "Distortion 1",
        values: [0, 64, 0, 87, 14, 6, 0, 3134, 157, 0, 1],
    },
    Preset {
        name: "Distortion 2",
        values: [0, 64, 127, 87, 14, 0, 1, 3134, 102, 0, 0],
    },
    Preset {
        name: "Distortion 3",
        values: [0, 64, 127, 127, 12, 13, 0, 5078, 56, 0, 1],
    },
    Preset {
        name: "Guitar Amp",
        values: [84, 64, 35, 63, 50, 2, 0, 824, 21, 0, 0],
    },
];

/// Highest cutoff accepted for the tone filters.
const MAX_FILTER_HZ: i32 = 26_000;

#[derive(Clone, Debug)]
struct Channel {
    lpf: AnalogFilter,
    hpf: AnalogFilter,
    octave_smooth: AnalogFilter,
    dc_block: AnalogFilter,
    shaper: WaveShaper,
    toggle: f32,
    octave_memory: f32,
}

impl Channel {
    fn new(sample_rate: f32) -> Result<Self, Error> {
        Ok(Self {
            lpf: AnalogFilter::new(FilterKind::LowPass, 22_000.0, 1.0, 0, sample_rate)?,
            hpf: AnalogFilter::new(FilterKind::HighPass, 20.0, 1.0, 0, sample_rate)?,
            octave_smooth: AnalogFilter::new(FilterKind::LowPass, 75.0, 1.0, 0, sample_rate)?,
            dc_block: AnalogFilter::new(FilterKind::HighPass, 30.0, 1.0, 0, sample_rate)?,
            shaper: WaveShaper::new(),
            toggle: 1.0,
            octave_memory: -1.0,
        })
    }

    #[inline]
    fn filter(&mut self, x: f32) -> f32 {
        let x = self.lpf.process(x);
        self.hpf.process(x)
    }

    /// Flip polarity on every upward zero crossing, then smooth.
    #[inline]
    fn octave(&mut self, x: f32) -> f32 {
        if self.octave_memory < 0.0 && x > 0.0 {
            self.toggle = -self.toggle;
        }
        self.octave_memory = x;
        self.octave_smooth.process(x * self.toggle)
    }

    fn cleanup(&mut self) {
        self.lpf.cleanup();
        self.hpf.cleanup();
        self.octave_smooth.cleanup();
        self.dc_block.cleanup();
        self.shaper.cleanup();
        self.toggle = 1.0;
        self.octave_memory = -1.0;
    }
}

/// Stereo distortion built from two filter chains and two waveshapers.
///
/// Parameters are plain integers addressed by index (see [`params`]); writes
/// are clamped to each parameter's range and unknown indices are ignored.
///
/// # Example
///
/// ```
/// use klangwerk::dsp::{params, Distortion, SignalProcessor};
///
/// let mut fx = Distortion::new(44_100.0)?;
/// fx.set_preset(0);
/// fx.change_param(params::DRIVE, 100);
/// assert_eq!(fx.get_param(params::DRIVE), 100);
///
/// let y = fx.process(0.5);
/// assert!(y.is_finite());
/// # Ok::<(), klangwerk::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Distortion {
    left: Channel,
    right: Channel,

    p_volume: i32,
    p_panning: i32,
    p_lrcross: i32,
    p_drive: i32,
    p_level: i32,
    p_type: i32,
    p_negate: i32,
    p_lpf: i32,
    p_hpf: i32,
    p_stereo: bool,
    p_prefiltering: bool,
    p_octave: i32,
    preset: usize,

    volume: f32,
    panning: f32,
    lrcross: f32,
    octave_mix: f32,
    input_gain: f32,
    level: f32,
    shape: PreparedShape,
}

impl Distortion {
    /// Build the effect with the "Overdrive 1" preset applied.
    pub fn new(sample_rate: f32) -> Result<Self, Error> {
        let mut fx = Self {
            left: Channel::new(sample_rate)?,
            right: Channel::new(sample_rate)?,
            p_volume: 50,
            p_panning: 64,
            p_lrcross: 40,
            p_drive: 90,
            p_level: 64,
            p_type: 0,
            p_negate: 0,
            p_lpf: 127,
            p_hpf: 0,
            p_stereo: false,
            p_prefiltering: false,
            p_octave: 0,
            preset: 0,
            volume: 0.0,
            panning: 0.0,
            lrcross: 0.0,
            octave_mix: 0.0,
            input_gain: 1.0,
            level: 1.0,
            shape: PreparedShape::new(ShapeKind::Arctangent, 90, true),
        };
        fx.set_preset(0);
        Ok(fx)
    }

    /// Apply preset `index` in one step and reset internal state.
    ///
    /// Unknown indices leave the effect untouched and return `false`.
    pub fn set_preset(&mut self, index: usize) -> bool {
        let Some(preset) = PRESETS.get(index) else {
            return false;
        };
        for (param, &value) in preset.values.iter().enumerate() {
            self.change_param(param, value);
        }
        self.preset = index;
        self.cleanup();
        true
    }

    /// Index of the most recently applied preset.
    pub fn preset(&self) -> usize {
        self.preset
    }

    pub fn change_param(&mut self, index: usize, value: i32) {
        match index {
            params::VOLUME => {
                self.p_volume = value.clamp(0, 127);
                self.volume = self.p_volume as f32 / 127.0;
                if self.p_volume == 0 {
                    self.cleanup();
                }
            }
            params::PANNING => {
                self.p_panning = value.clamp(0, 127);
                self.panning = (self.p_panning as f32 + 0.5) / 127.0;
            }
            params::LR_CROSS => {
                self.p_lrcross = value.clamp(0, 127);
                self.lrcross = self.p_lrcross as f32 / 127.0;
            }
            params::DRIVE => {
                self.p_drive = value.clamp(0, 127);
                self.update_gain();
                self.update_shape();
            }
            params::LEVEL => {
                self.p_level = value.clamp(0, 127);
                self.level = db_to_gain(60.0 * self.p_level as f32 / 127.0 - 40.0);
            }
            params::TYPE => {
                self.p_type = value.clamp(0, NUM_SHAPE_KINDS as i32 - 1);
                self.update_shape();
            }
            params::NEGATE => {
                self.p_negate = value.clamp(0, 1);
                self.update_gain();
            }
            params::LPF => {
                self.p_lpf = value.clamp(0, MAX_FILTER_HZ);
                self.left.lpf.set_frequency(self.p_lpf as f32);
                self.right.lpf.set_frequency(self.p_lpf as f32);
            }
            params::HPF => {
                self.p_hpf = value.clamp(0, MAX_FILTER_HZ);
                self.left.hpf.set_frequency(self.p_hpf as f32);
                self.right.hpf.set_frequency(self.p_hpf as f32);
            }
            params::STEREO => self.p_stereo = value > 0,
            params::PREFILTERING => self.p_prefiltering = value > 0,
            params::OCTAVE => {
                self.p_octave = value.clamp(0, 127);
                self.octave_mix = self.p_octave as f32 / 127.0;
            }
            _ => {}
        }
    }

    /// Current value of parameter `index`, or 0 for unknown indices.
    pub fn get_param(&self, index: usize) -> i32 {
        match index {
            params::VOLUME => self.p_volume,
            params::PANNING => self.p_panning,
            params::LR_CROSS => self.p_lrcross,
            params::DRIVE => self.p_drive,
            params::LEVEL => self.p_level,
            params::TYPE => self.p_type,
            params::NEGATE => self.p_negate,
            params::LPF => self.p_lpf,
            params::HPF => self.p_hpf,
            params::STEREO => i32::from(self.p_stereo),
            params::PREFILTERING => i32::from(self.p_prefiltering),
            params::OCTAVE => self.p_octave,
            _ => 0,
        }
    }

    /// Wet level in `[0, 1]` derived from [`params::VOLUME`]. The effect does
    /// not apply it itself; hosts mixing dry and wet signal read it here.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Reset filters, octave toggles and waveshaper state.
    pub fn cleanup(&mut self) {
        self.left.cleanup();
        self.right.cleanup();
    }

    fn update_gain(&mut self) {
        let gain = 5f32.powf((self.p_drive as f32 - 32.0) / 127.0);
        self.input_gain = if self.p_negate != 0 { -gain } else { gain };
    }

    fn update_shape(&mut self) {
        let kind = ShapeKind::from_id(self.p_type as usize).unwrap_or(ShapeKind::Arctangent);
        self.shape = PreparedShape::new(kind, self.p_drive as u8, true);
    }

    /// Process one stereo frame.
    pub fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (mut l, mut r) = if self.p_stereo {
            (left * self.input_gain * 2.0, right * self.input_gain * 2.0)
        } else {
            ((left + right) * self.input_gain, 0.0)
        };

        if self.p_prefiltering {
            l = self.left.filter(l);
            if self.p_stereo {
                r = self.right.filter(r);
            }
        }

        l = self.left.shaper.shape(l, &self.shape);
        if self.p_stereo {
            r = self.right.shaper.shape(r, &self.shape);
        }

        if !self.p_prefiltering {
            l = self.left.filter(l);
            if self.p_stereo {
                r = self.right.filter(r);
            }
        }

        if !self.p_stereo {
            r = l;
        }

        let crossed_l = l * (1.0 - self.lrcross) + r * self.lrcross;
        let crossed_r = r * (1.0 - self.lrcross) + l * self.lrcross;

        let (mut out_l, mut out_r) = (crossed_l, crossed_r);
        if self.octave_mix > 0.01 {
            let oct_l = self.left.octave(l);
            let oct_r = self.right.octave(r);
            out_l = crossed_l * (1.0 - self.octave_mix) + oct_l * self.octave_mix;
            out_r = crossed_r * (1.0 - self.octave_mix) + oct_r * self.octave_mix;
        }

        out_l *= 2.0 * self.level * self.panning;
        out_r *= 2.0 * self.level * (1.0 - self.panning);

        (
            self.left.dc_block.process(out_l),
            self.right.dc_block.process(out_r),
        )
    }

    /// Process a stereo block in place.
    pub fn out(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_frame(*l, *r);
        }
    }
}

/// Convert decibels to a linear gain factor.
#[inline]
pub(crate) fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

impl SignalProcessor for Distortion {
    /// Mono in, left channel out.
    fn process(&mut self, input: f32) -> f32 {
        let right = if self.p_stereo { input } else { 0.0 };
        self.process_frame(input, right).0
    }
}

impl SignalProcessorStereo for Distortion {
    /// Mono frames are treated as a single left channel; frames with more
    /// than two channels keep only the first two.
    fn process_signal(&mut self, input: Signal) -> Signal {
        let (l, r) = if input.is_mono() {
            let x = input.left();
            (x, if self.p_stereo { x } else { 0.0 })
        } else {
            (input.left(), input.right())
        };
        let (l, r) = self.process_frame(l, r);
        Signal::stereo(l, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::TAU;

    fn sine(n: usize, freq: f32, amp: f32) -> Vec<f32> {
        (0..n)
            .map(|i| (TAU * freq * i as f32 / 44_100.0).sin() * amp)
            .collect()
    }

    #[test]
    fn presets_write_the_parameter_vector() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        for (index, preset) in PRESETS.iter().enumerate() {
            fx.set_preset(index);
            assert_eq!(fx.preset(), index);
            for (param, &value) in preset.values.iter().enumerate() {
                assert_eq!(fx.get_param(param), value, "{} param {param}", preset.name);
            }
        }
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        assert!(fx.set_preset(5));
        assert!(!fx.set_preset(NUM_PRESETS));
        assert_eq!(fx.preset(), 5);
        assert_eq!(fx.get_param(params::LPF), 824);
    }

    #[test]
    fn unknown_params_read_zero_and_ignore_writes() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        fx.change_param(params::RESERVED, 99);
        fx.change_param(NUM_PARAMS + 3, 99);
        assert_eq!(fx.get_param(params::RESERVED), 0);
        assert_eq!(fx.get_param(NUM_PARAMS + 3), 0);
    }

    #[test]
    fn params_are_clamped() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        fx.change_param(params::TYPE, 64);
        fx.change_param(params::DRIVE, -5);
        fx.change_param(params::NEGATE, 7);
        assert_eq!(fx.get_param(params::TYPE), 29);
        assert_eq!(fx.shape_kind(), ShapeKind::DiodeClipper);
        assert_eq!(fx.get_param(params::DRIVE), 0);
        assert_eq!(fx.get_param(params::NEGATE), 1);
    }

    #[test]
    fn silence_in_silence_out() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        let mut left = vec![0.0; 512];
        let mut right = vec![0.0; 512];
        fx.out(&mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn every_preset_stays_finite() {
        let input = sine(4096, 220.0, 0.8);
        for index in 0..NUM_PRESETS {
            let mut fx = Distortion::new(44_100.0).unwrap();
            fx.set_preset(index);
            fx.change_param(params::OCTAVE, 64);
            let mut block = input.clone();
            fx.process_block(&mut block);
            assert!(block.iter().all(|s| s.is_finite()), "preset {index}");
        }
    }

    #[test]
    fn panning_moves_energy_between_channels() {
        let input = sine(4096, 220.0, 0.5);
        let energy = |pan: i32| {
            let mut fx = Distortion::new(44_100.0).unwrap();
            fx.change_param(params::LR_CROSS, 0);
            fx.change_param(params::PANNING, pan);
            let mut l = input.clone();
            let mut r = input.clone();
            fx.out(&mut l, &mut r);
            let e = |b: &[f32]| b.iter().map(|s| s * s).sum::<f32>();
            (e(&l), e(&r))
        };
        let (l, r) = energy(127);
        assert!(l > r * 100.0);
        let (l, r) = energy(0);
        assert!(r > l * 100.0);
    }

    #[test]
    fn zero_volume_clears_state() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        let mut block = sine(256, 440.0, 0.7);
        fx.process_block(&mut block);

        let mut fresh = Distortion::new(44_100.0).unwrap();
        fx.change_param(params::VOLUME, 0);
        fresh.change_param(params::VOLUME, 0);
        let probe = sine(64, 440.0, 0.7);
        let mut a = probe.clone();
        let mut b = probe;
        fx.process_block(&mut a);
        fresh.process_block(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn stereo_signal_round_trip_keeps_two_channels() {
        let mut fx = Distortion::new(44_100.0).unwrap();
        let out = fx.process_signal(Signal::mono(0.3));
        assert!(out.is_stereo());
    }
}
