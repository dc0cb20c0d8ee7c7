//! Two-pole analog-modelled low-pass and high-pass filters.

use core::f32::consts::TAU;

use crate::error::Error;

use super::SignalProcessor;

/// Cascaded biquads allowed per filter (`stages` is 0-based).
pub const MAX_FILTER_STAGES: usize = 5;

/// Cutoffs closer than this to Nyquist disable the filter.
const NYQUIST_GUARD: f32 = 500.0;
const MIN_FREQUENCY: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
}

#[derive(Clone, Copy, Debug, Default)]
struct History {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Coefficients {
    c0: f32,
    c1: f32,
    c2: f32,
    d1: f32,
    d2: f32,
}

/// A 2-pole filter with up to [`MAX_FILTER_STAGES`] identical sections in
/// series.
///
/// Coefficients are recomputed on the first `process` after a parameter
/// change, never per sample. A cutoff within 500 Hz of Nyquist turns a
/// low-pass into a wire and a high-pass into silence.
///
/// ```
/// use klangwerk::dsp::{AnalogFilter, FilterKind, SignalProcessor};
///
/// let mut dc_blocker = AnalogFilter::new(FilterKind::HighPass, 30.0, 1.0, 0, 44_100.0)?;
/// let mut out = 1.0;
/// for _ in 0..44_100 {
///     out = dc_blocker.process(1.0);
/// }
/// assert!(out.abs() < 1e-3);
/// # Ok::<(), klangwerk::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct AnalogFilter {
    kind: FilterKind,
    frequency: f32,
    q: f32,
    stages: usize,
    sample_rate: f32,
    coefficients: Coefficients,
    history: [History; MAX_FILTER_STAGES],
    dirty: bool,
}

impl AnalogFilter {
    /// `stages` counts extra sections: 0 is a single biquad.
    pub fn new(
        kind: FilterKind,
        frequency: f32,
        q: f32,
        stages: usize,
        sample_rate: f32,
    ) -> Result<Self, Error> {
        if stages >= MAX_FILTER_STAGES {
            return Err(Error::InvalidFilterStages {
                stages,
                max: MAX_FILTER_STAGES - 1,
            });
        }
        if sample_rate.is_nan() || sample_rate <= 0.0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        let mut filter = Self {
            kind,
            frequency: MIN_FREQUENCY,
            q: 0.0,
            stages,
            sample_rate,
            coefficients: Coefficients::default(),
            history: [History::default(); MAX_FILTER_STAGES],
            dirty: true,
        };
        filter.set_frequency(frequency);
        filter.set_q(q);
        filter.compute_coefficients();
        Ok(filter)
    }

    pub fn low_pass(frequency: f32, sample_rate: f32) -> Result<Self, Error> {
        Self::new(FilterKind::LowPass, frequency, 1.0, 0, sample_rate)
    }

    pub fn high_pass(frequency: f32, sample_rate: f32) -> Result<Self, Error> {
        Self::new(FilterKind::HighPass, frequency, 1.0, 0, sample_rate)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    /// Cutoff in Hz, never below 0.1.
    pub fn set_frequency(&mut self, frequency: f32) {
        let frequency = frequency.max(MIN_FREQUENCY);
        if frequency != self.frequency {
            self.frequency = frequency;
            self.dirty = true;
        }
    }

    /// Negative values are clamped to 0.
    pub fn set_q(&mut self, q: f32) {
        let q = q.max(0.0);
        if q != self.q {
            self.q = q;
            self.dirty = true;
        }
    }

    pub fn set_frequency_and_q(&mut self, frequency: f32, q: f32) {
        self.set_frequency(frequency);
        self.set_q(q);
    }

    /// Zero the delay lines. Frequency and Q are kept.
    pub fn cleanup(&mut self) {
        self.history = [History::default(); MAX_FILTER_STAGES];
    }

    /// Filter `buffer` in place.
    pub fn filterout(&mut self, buffer: &mut [f32]) {
        self.process_block(buffer);
    }

    fn compute_coefficients(&mut self) {
        self.dirty = false;

        if self.frequency > self.sample_rate / 2.0 - NYQUIST_GUARD {
            let pass = match self.kind {
                FilterKind::LowPass => 1.0,
                FilterKind::HighPass => 0.0,
            };
            self.coefficients = Coefficients {
                c0: pass,
                ..Coefficients::default()
            };
            return;
        }

        // cascaded sections share the resonance
        let q = if self.stages > 0 && self.q > 1.0 {
            self.q.powf(1.0 / (self.stages as f32 + 1.0))
        } else {
            self.q
        };

        let omega = TAU * self.frequency / self.sample_rate;
        let (sn, cs) = omega.sin_cos();
        let alpha = sn / (2.0 * q).max(1e-6);
        let tmp = 1.0 + alpha;

        let (c0, c1) = match self.kind {
            FilterKind::LowPass => ((1.0 - cs) * 0.5 / tmp, (1.0 - cs) / tmp),
            FilterKind::HighPass => ((1.0 + cs) * 0.5 / tmp, -(1.0 + cs) / tmp),
        };
        self.coefficients = Coefficients {
            c0,
            c1,
            c2: c0,
            d1: 2.0 * cs / tmp,
            d2: -(1.0 - alpha) / tmp,
        };
    }
}

impl SignalProcessor for AnalogFilter {
    fn process(&mut self, input: f32) -> f32 {
        if self.dirty {
            self.compute_coefficients();
        }
        let c = self.coefficients;
        let mut sample = input;
        for h in self.history.iter_mut().take(self.stages + 1) {
            let y0 = sample * c.c0 + h.x1 * c.c1 + h.x2 * c.c2 + h.y1 * c.d1 + h.y2 * c.d2;
            h.x2 = h.x1;
            h.x1 = sample;
            h.y2 = h.y1;
            h.y1 = y0;
            sample = y0;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine_rms(filter: &mut AnalogFilter, frequency: f32) -> f32 {
        let sr = 44_100.0;
        let n = 8192;
        let mut sum = 0.0;
        for i in 0..n {
            let x = (TAU * frequency * i as f32 / sr).sin();
            let y = filter.process(x);
            if i >= n / 2 {
                sum += y * y;
            }
        }
        (sum / (n / 2) as f32).sqrt()
    }

    #[test]
    fn low_pass_passes_dc() {
        let mut f = AnalogFilter::low_pass(1000.0, 44_100.0).unwrap();
        let mut out = 0.0;
        for _ in 0..2000 {
            out = f.process(1.0);
        }
        assert_abs_diff_eq!(out, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn high_pass_blocks_dc() {
        let mut f = AnalogFilter::high_pass(1000.0, 44_100.0).unwrap();
        let mut out = 1.0;
        for _ in 0..2000 {
            out = f.process(1.0);
        }
        assert!(out.abs() < 1e-3, "got {out}");
    }

    #[test]
    fn low_pass_attenuates_above_cutoff() {
        let mut low = AnalogFilter::low_pass(300.0, 44_100.0).unwrap();
        let mut high = low.clone();
        let pass = sine_rms(&mut low, 100.0);
        let stop = sine_rms(&mut high, 5000.0);
        assert!(stop < pass * 0.05, "pass {pass} stop {stop}");
    }

    #[test]
    fn more_stages_cut_harder() {
        let mut one = AnalogFilter::new(FilterKind::LowPass, 500.0, 0.7, 0, 44_100.0).unwrap();
        let mut three = AnalogFilter::new(FilterKind::LowPass, 500.0, 0.7, 2, 44_100.0).unwrap();
        assert!(sine_rms(&mut three, 4000.0) < sine_rms(&mut one, 4000.0));
    }

    #[test]
    fn near_nyquist_bypasses_or_mutes() {
        let mut low = AnalogFilter::low_pass(22_000.0, 44_100.0).unwrap();
        let mut high = AnalogFilter::high_pass(22_000.0, 44_100.0).unwrap();
        assert_eq!(low.process(0.7), 0.7);
        assert_eq!(high.process(0.7), 0.0);
    }

    #[test]
    fn rejects_too_many_stages() {
        let err = AnalogFilter::new(FilterKind::LowPass, 100.0, 1.0, MAX_FILTER_STAGES, 44_100.0);
        assert!(matches!(err, Err(Error::InvalidFilterStages { .. })));
    }

    #[test]
    fn clamps_parameters() {
        let mut f = AnalogFilter::low_pass(1000.0, 44_100.0).unwrap();
        f.set_frequency(-10.0);
        f.set_q(-3.0);
        assert_eq!(f.frequency(), MIN_FREQUENCY);
        assert_eq!(f.q(), 0.0);
        assert!(f.process(1.0).is_finite());
    }

    #[test]
    fn cleanup_keeps_settings() {
        let mut f = AnalogFilter::low_pass(1000.0, 44_100.0).unwrap();
        let first = f.process(1.0);
        f.process(1.0);
        f.cleanup();
        assert_eq!(f.process(1.0), first);
        assert_eq!(f.frequency(), 1000.0);
    }
}
