//! Phase-accumulator wavetable oscillator.

use core::f32::consts::TAU;

use alloc::vec::Vec;

use super::SignalSource;

pub const DEFAULT_TABLE_SIZE: usize = 512;

/// Waveform kinds understood by [`fill`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
    Noise,
}

/// Write exactly one period of `waveform` into `table`.
///
/// Every kind except [`Waveform::Noise`] is deterministic. Noise draws fresh
/// values on every call.
pub fn fill(table: &mut [f32], waveform: Waveform) {
    let len = table.len() as f32;
    for (i, sample) in table.iter_mut().enumerate() {
        let phase = i as f32 / len;
        *sample = match waveform {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Noise => fastrand::f32() * 2.0 - 1.0,
        };
    }
}

/// A table-lookup oscillator.
///
/// The table holds one waveform period. `step` is derived from the frequency
/// and only recomputed when the frequency changes.
///
/// # Example
///
/// ```
/// use klangwerk::dsp::{SignalSource, Waveform, Wavetable};
///
/// let mut osc = Wavetable::new(Waveform::Sine, 512, 44_100.0);
/// osc.set_frequency(220.0);
/// osc.set_amplitude(0.5);
///
/// let mut block = [0.0f32; 64];
/// osc.out(&mut block);
/// assert!(block.iter().all(|s| s.abs() <= 0.5));
/// ```
#[derive(Clone, Debug)]
pub struct Wavetable {
    table: Vec<f32>,
    waveform: Waveform,
    sample_rate: f32,
    phase: f32,
    frequency: f32,
    step: f32,
    amplitude: f32,
    target_amplitude: f32,
    amplitude_delta: f32,
    ramp_remaining: u32,
    interpolate: bool,
}

impl Wavetable {
    pub fn new(waveform: Waveform, table_size: usize, sample_rate: f32) -> Self {
        let mut table = alloc::vec![0.0; table_size];
        fill(&mut table, waveform);
        Self::from_table(table, waveform, sample_rate)
    }

    /// Wrap a caller-provided table. An empty table yields silence.
    pub fn with_table(table: Vec<f32>, sample_rate: f32) -> Self {
        Self::from_table(table, Waveform::Sine, sample_rate)
    }

    fn from_table(table: Vec<f32>, waveform: Waveform, sample_rate: f32) -> Self {
        let mut osc = Self {
            table,
            waveform,
            sample_rate,
            phase: 0.0,
            frequency: 0.0,
            step: 0.0,
            amplitude: 1.0,
            target_amplitude: 1.0,
            amplitude_delta: 0.0,
            ramp_remaining: 0,
            interpolate: false,
        };
        osc.set_frequency(220.0);
        osc
    }

    /// Refill the table with another waveform. Phase is kept.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        fill(&mut self.table, waveform);
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn table(&self) -> &[f32] {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut [f32] {
        &mut self.table
    }

    /// Non-finite frequencies are ignored.
    pub fn set_frequency(&mut self, frequency: f32) {
        if !frequency.is_finite() {
            return;
        }
        if frequency != self.frequency {
            self.frequency = frequency;
            self.step = frequency * self.table.len() as f32 / self.sample_rate;
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Jump to `amplitude` on the next sample. NaN is ignored.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        if amplitude.is_nan() {
            return;
        }
        self.amplitude = amplitude;
        self.target_amplitude = amplitude;
        self.ramp_remaining = 0;
    }

    /// Move linearly to `amplitude` over the next `ramp_samples` outputs.
    pub fn set_amplitude_ramped(&mut self, amplitude: f32, ramp_samples: u32) {
        if amplitude.is_nan() {
            return;
        }
        if ramp_samples == 0 {
            self.set_amplitude(amplitude);
            return;
        }
        self.target_amplitude = amplitude;
        self.amplitude_delta = (amplitude - self.amplitude) / ramp_samples as f32;
        self.ramp_remaining = ramp_samples;
    }

    /// The amplitude applied to the most recent sample.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn interpolate_samples(&mut self, interpolate: bool) {
        self.interpolate = interpolate;
    }

    /// Rewind the phase to the start of the table.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    fn advance_amplitude(&mut self) {
        if self.ramp_remaining > 0 {
            self.ramp_remaining -= 1;
            if self.ramp_remaining == 0 {
                self.amplitude = self.target_amplitude;
            } else {
                self.amplitude += self.amplitude_delta;
            }
        }
    }
}

impl SignalSource for Wavetable {
    fn output(&mut self) -> f32 {
        let len = self.table.len();
        if len == 0 {
            return 0.0;
        }
        let len_f = len as f32;

        self.phase += self.step;
        if self.phase >= len_f || self.phase < 0.0 {
            self.phase = self.phase.rem_euclid(len_f);
            // rem_euclid can round up to len for tiny negative phases
            if self.phase >= len_f {
                self.phase = 0.0;
            }
        }

        let index = self.phase as usize;
        let sample = if self.interpolate {
            let frac = self.phase - index as f32;
            let next = (index + 1) % len;
            self.table[index] * (1.0 - frac) + self.table[next] * frac
        } else {
            self.table[index]
        };

        self.advance_amplitude();
        sample * self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn filled_shapes_hit_their_corners() {
        let mut table = [0.0f32; 8];
        fill(&mut table, Waveform::Square);
        assert_eq!(table, [1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0]);

        fill(&mut table, Waveform::Sawtooth);
        assert_eq!(table[0], -1.0);
        assert_abs_diff_eq!(table[4], 0.0);

        fill(&mut table, Waveform::Triangle);
        assert_abs_diff_eq!(table[2], 1.0);
        assert_abs_diff_eq!(table[6], -1.0);

        fill(&mut table, Waveform::Sine);
        assert_abs_diff_eq!(table[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn noise_is_bounded_and_redrawn() {
        let mut a = [0.0f32; 256];
        let mut b = [0.0f32; 256];
        fill(&mut a, Waveform::Noise);
        fill(&mut b, Waveform::Noise);
        assert!(a.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_ne!(a, b);
    }

    #[test]
    fn per_sample_matches_block() {
        let mut a = Wavetable::new(Waveform::Sawtooth, 512, 48_000.0);
        let mut b = a.clone();
        for osc in [&mut a, &mut b] {
            osc.set_frequency(313.0);
            osc.interpolate_samples(true);
            osc.set_amplitude_ramped(0.3, 100);
        }

        let one_by_one: Vec<f32> = (0..1000).map(|_| a.output()).collect();
        let mut block = alloc::vec![0.0f32; 1000];
        b.out(&mut block);
        assert_eq!(one_by_one, block);
    }

    #[test]
    fn amplitude_ramp_is_linear() {
        let mut osc = Wavetable::with_table(alloc::vec![1.0; 16], 44_100.0);
        osc.set_amplitude(0.0);
        osc.set_amplitude_ramped(1.0, 4);
        let out: Vec<f32> = (0..6).map(|_| osc.output()).collect();
        assert_abs_diff_eq!(out[0], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 0.75, epsilon = 1e-6);
        assert_eq!(out[3], 1.0);
        assert_eq!(out[5], 1.0);
    }

    #[test]
    fn phase_wraps_at_table_length() {
        let mut osc = Wavetable::new(Waveform::Sine, 64, 64.0);
        // one table length per second at sr = 64 means step = 1
        osc.set_frequency(1.0);
        for _ in 0..200 {
            osc.output();
            assert!(osc.phase() < 64.0);
        }
        assert_abs_diff_eq!(osc.phase(), 200.0 % 64.0);
    }

    #[test]
    fn empty_table_is_silent() {
        let mut osc = Wavetable::with_table(Vec::new(), 44_100.0);
        assert_eq!(osc.output(), 0.0);
    }

    #[test]
    fn nan_frequency_keeps_the_oscillator_running() {
        let mut osc = Wavetable::new(Waveform::Sine, 512, 44_100.0);
        osc.set_frequency(f32::NAN);
        assert_eq!(osc.frequency(), 220.0);
        osc.set_frequency(440.0);
        let out: Vec<f32> = (0..100).map(|_| osc.output()).collect();
        assert!(osc.phase().is_finite());
        assert!(out.iter().all(|s| s.is_finite()));
        assert!(out.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn nan_amplitude_is_ignored() {
        let mut osc = Wavetable::with_table(alloc::vec![1.0; 16], 44_100.0);
        osc.set_amplitude(0.5);
        osc.set_amplitude(f32::NAN);
        osc.set_amplitude_ramped(f32::NAN, 8);
        assert_eq!(osc.output(), 0.5);
    }
}
