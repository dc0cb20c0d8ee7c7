//! Four-pole resonant ladder low-pass.

use crate::error::Error;

use super::SignalProcessor;

/// Moog-style 24 dB/oct low-pass after Stilson and Smith.
///
/// Four one-pole sections in series with negative feedback from the last
/// stage. A resonance of 1.0 sits on the edge of self-oscillation; the cubic
/// soft clip on the output keeps it bounded there.
#[derive(Clone, Debug)]
pub struct LadderLowPass {
    sample_rate: f32,
    frequency: f32,
    resonance: f32,

    k: f32,
    p: f32,
    r: f32,
    dirty: bool,

    y: [f32; 4],
    old_x: f32,
    old_y: [f32; 3],
}

impl LadderLowPass {
    pub fn new(frequency: f32, resonance: f32, sample_rate: f32) -> Result<Self, Error> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        let mut filter = Self {
            sample_rate,
            frequency: 0.0,
            resonance: 0.0,
            k: 0.0,
            p: 0.0,
            r: 0.0,
            dirty: true,
            y: [0.0; 4],
            old_x: 0.0,
            old_y: [0.0; 3],
        };
        filter.set_frequency(frequency);
        filter.set_resonance(resonance);
        filter.update_coefficients();
        Ok(filter)
    }

    /// Cutoff in Hz, clamped to `[0, sample_rate / 2]`. NaN is ignored.
    pub fn set_frequency(&mut self, frequency: f32) {
        if frequency.is_nan() {
            return;
        }
        let frequency = frequency.clamp(0.0, self.sample_rate * 0.5);
        if frequency != self.frequency {
            self.frequency = frequency;
            self.dirty = true;
        }
    }

    /// Resonance, clamped to `[0, 1]`. NaN is ignored.
    pub fn set_resonance(&mut self, resonance: f32) {
        if resonance.is_nan() {
            return;
        }
        let resonance = resonance.clamp(0.0, 1.0);
        if resonance != self.resonance {
            self.resonance = resonance;
            self.dirty = true;
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Zero the four poles. Cutoff and resonance are kept.
    pub fn cleanup(&mut self) {
        self.y = [0.0; 4];
        self.old_x = 0.0;
        self.old_y = [0.0; 3];
    }

    /// Filter `buffer` in place.
    pub fn filterout(&mut self, buffer: &mut [f32]) {
        self.process_block(buffer);
    }

    fn update_coefficients(&mut self) {
        let f = (2.0 * self.frequency / self.sample_rate).clamp(0.0, 1.0);
        self.k = 3.6 * f - 1.6 * f * f - 1.0;
        self.p = (self.k + 1.0) * 0.5;
        let scale = ((1.0 - self.p) * 1.386_249).exp();
        self.r = self.resonance * scale;
        self.dirty = false;
    }
}

impl SignalProcessor for LadderLowPass {
    fn process(&mut self, input: f32) -> f32 {
        if self.dirty {
            self.update_coefficients();
        }
        let (k, p) = (self.k, self.p);

        let x = input - self.r * self.y[3];
        self.y[0] = x * p + self.old_x * p - k * self.y[0];
        self.y[1] = self.y[0] * p + self.old_y[0] * p - k * self.y[1];
        self.y[2] = self.y[1] * p + self.old_y[1] * p - k * self.y[2];
        self.y[3] = self.y[2] * p + self.old_y[2] * p - k * self.y[3];
        self.y[3] -= self.y[3] * self.y[3] * self.y[3] / 6.0;

        self.old_x = x;
        self.old_y = [self.y[0], self.y[1], self.y[2]];

        if !self.y[3].is_finite() {
            self.cleanup();
            return 0.0;
        }
        self.y[3]
    }
}
