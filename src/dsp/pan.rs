//! Stereo panning.

use core::f32::consts::FRAC_PI_2;

use itertools::izip;

use super::{Signal, SignalProcessorStereo, LEFT, RIGHT};

/// Curve relating the pan position to the two channel gains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanLaw {
    /// Gains sum to one; the centre is 6 dB down per side.
    #[default]
    Linear,
    /// Square-root gains, close to constant power.
    SquareLaw,
    /// Quarter-sine gains, constant power.
    SineLaw,
}

impl PanLaw {
    /// `(left, right)` gains for a normalised position in `[0, 1]`.
    pub fn gains(self, position: f32) -> (f32, f32) {
        match self {
            PanLaw::Linear => (1.0 - position, position),
            PanLaw::SquareLaw => ((1.0 - position).sqrt(), position.sqrt()),
            PanLaw::SineLaw => (
                ((1.0 - position) * FRAC_PI_2).sin(),
                (position * FRAC_PI_2).sin(),
            ),
        }
    }
}

/// Places a signal between the left (-1) and right (+1) channel.
#[derive(Clone, Debug)]
pub struct Pan {
    law: PanLaw,
    panning: f32,
    left_gain: f32,
    right_gain: f32,
}

impl Default for Pan {
    fn default() -> Self {
        Self::new(PanLaw::Linear)
    }
}

impl Pan {
    pub fn new(law: PanLaw) -> Self {
        let mut pan = Self {
            law,
            panning: 0.0,
            left_gain: 0.0,
            right_gain: 0.0,
        };
        pan.set_panning(0.0);
        pan
    }

    pub fn set_law(&mut self, law: PanLaw) {
        self.law = law;
        self.update_gains();
    }

    pub fn law(&self) -> PanLaw {
        self.law
    }

    /// Clamped to `[-1, 1]`.
    pub fn set_panning(&mut self, panning: f32) {
        self.panning = if panning.is_nan() {
            0.0
        } else {
            panning.clamp(-1.0, 1.0)
        };
        self.update_gains();
    }

    pub fn panning(&self) -> f32 {
        self.panning
    }

    /// Position mapped onto `[0, 1]`.
    pub fn normalized(&self) -> f32 {
        (self.panning + 1.0) * 0.5
    }

    fn update_gains(&mut self) {
        (self.left_gain, self.right_gain) = self.law.gains(self.normalized());
    }

    /// Position a mono sample.
    pub fn process(&self, input: f32) -> Signal {
        Signal::stereo(input * self.left_gain, input * self.right_gain)
    }

    /// Fill a stereo block from a mono block.
    pub fn out(&self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        for (x, l, r) in izip!(input, left.iter_mut(), right.iter_mut()) {
            *l = x * self.left_gain;
            *r = x * self.right_gain;
        }
    }
}

impl SignalProcessorStereo for Pan {
    /// Mono input is positioned; stereo input is biased. Channels beyond the
    /// second are dropped.
    fn process_signal(&mut self, input: Signal) -> Signal {
        if input.is_mono() {
            return self.process(input.left());
        }
        Signal::stereo(
            input.get(LEFT) * self.left_gain,
            input.get(RIGHT) * self.right_gain,
        )
    }
}
