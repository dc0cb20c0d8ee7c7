//! Nonlinear transfer functions for distortion.
//!
//! Thirty shapes, each addressed by a stable integer id. `drive` (0..=127)
//! is mapped to a shaping factor once per parameter change, then every sample
//! goes through the selected curve. The compression, JFET and valve shapes
//! carry state from sample to sample and from call to call; that history is
//! part of their sound and is only cleared by [`WaveShaper::cleanup`].

use core::f32::consts::SQRT_2;

pub const NUM_SHAPE_KINDS: usize = 30;

const TWO_PI: f32 = 6.283_185;
const CRUNCH_GAIN: f32 = 100.0;
const THI: f32 = 0.67;
const TLO: f32 = -0.65;
const TLC: f32 = -0.613_944_5;
const THC: f32 = 0.636_583_4;
const DIV_TLC: f32 = 0.002;
const DIV_THC: f32 = 0.001_666_6;

/// Decay of the dynamic terms, tuned for a 44.1 kHz stream (roughly a
/// 60 Hz sub-modulation). It does not follow the engine sample rate.
pub const DYNO_DECAY: f32 = 0.0167 / (1.0 / 44_100.0 + 0.0167);

// valve models
const V_SUPPLY: f32 = 200.0;
const V_GRID_BIAS: f32 = 0.075;
const PLATE_R: f32 = 220_000.0;
const BIAS_CURRENT: f32 = 0.0002;
const MU: f32 = 100.0;
const V2_BIAS: f32 = 1.5;
const V_FACT: f32 = 12.0;
const F_FACT: f32 = 40.0;
const V_MIN: f32 = V_SUPPLY - 2.5;
const V_FACTOR: f32 = 1.5;

/// The transfer functions, in id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShapeKind {
    Arctangent = 0,
    Asymmetric = 1,
    Pow = 2,
    Sine = 3,
    Quantisize = 4,
    Zigzag = 5,
    Limiter = 6,
    UpperLimiter = 7,
    LowerLimiter = 8,
    InverseLimiter = 9,
    Clip = 10,
    Asym2 = 11,
    Pow2 = 12,
    Sigmoid = 13,
    SqrtCrunch = 14,
    SqrtCrunch2 = 15,
    OctaveUp = 16,
    Asymmetric2 = 17,
    Asymmetric3 = 18,
    Compression = 19,
    Overdrive = 20,
    Soft = 21,
    SuperSoft = 22,
    HardCompression = 23,
    OpAmpLimiting = 24,
    Jfet = 25,
    DynoJfet = 26,
    Valve1 = 27,
    Valve2 = 28,
    DiodeClipper = 29,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; NUM_SHAPE_KINDS] = [
        ShapeKind::Arctangent,
        ShapeKind::Asymmetric,
        ShapeKind::Pow,
        ShapeKind::Sine,
        ShapeKind::Quantisize,
        ShapeKind::Zigzag,
        ShapeKind::Limiter,
        ShapeKind::UpperLimiter,
        ShapeKind::LowerLimiter,
        ShapeKind::InverseLimiter,
        ShapeKind::Clip,
        ShapeKind::Asym2,
        ShapeKind::Pow2,
        ShapeKind::Sigmoid,
        ShapeKind::SqrtCrunch,
        ShapeKind::SqrtCrunch2,
        ShapeKind::OctaveUp,
        ShapeKind::Asymmetric2,
        ShapeKind::Asymmetric3,
        ShapeKind::Compression,
        ShapeKind::Overdrive,
        ShapeKind::Soft,
        ShapeKind::SuperSoft,
        ShapeKind::HardCompression,
        ShapeKind::OpAmpLimiting,
        ShapeKind::Jfet,
        ShapeKind::DynoJfet,
        ShapeKind::Valve1,
        ShapeKind::Valve2,
        ShapeKind::DiodeClipper,
    ];

    const NAMES: [&'static str; NUM_SHAPE_KINDS] = [
        "Arctangent",
        "Asymmetric",
        "Pow",
        "Sine",
        "Quantisize",
        "Zigzag",
        "Limiter",
        "Upper Limiter",
        "Lower Limiter",
        "Inverse Limiter",
        "Clip",
        "Asym2",
        "Pow2",
        "Sigmoid",
        "Sqrt Crunch",
        "Sqrt Crunch 2",
        "Octave Up",
        "Asymmetric 2",
        "Asymmetric 3",
        "Compression",
        "Overdrive",
        "Soft",
        "Super Soft",
        "Hard Compression",
        "Op Amp Limiting",
        "JFET",
        "Dyno JFET",
        "Valve 1",
        "Valve 2",
        "Diode Clipper",
    ];

    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    pub fn id(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        Self::NAMES[self.id()]
    }
}

/// Drive mapped onto one shape's curve parameters.
///
/// Building this involves `exp`/`pow`, so callers keep it around until the
/// shape or the drive changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreparedShape {
    kind: ShapeKind,
    drive: u8,
    ws: f32,
    /// normalisation divisor (or clip factor, depending on the shape)
    norm: f32,
    /// compression hardness
    ratio: f32,
}

impl PreparedShape {
    /// `with_gain` scales the input inside hard compression; pass `false`
    /// when gain is applied before the shaper.
    pub fn new(kind: ShapeKind, drive: u8, with_gain: bool) -> Self {
        let drive = drive.min(127);
        let base = f32::from(drive) / 127.0 + 0.000_01;
        let base = 1.0 - (-base * 4.0).exp();

        let mut ratio = 0.25;
        let mut norm = 1.0;
        let ws = match kind {
            ShapeKind::Arctangent | ShapeKind::Overdrive => {
                10f32.powf(base * base * 3.0) - 1.0 + 0.001
            }
            ShapeKind::Asymmetric => {
                let ws = base * base * 32.0 + 0.0001;
                norm = if ws < 1.0 { ws.sin() + 0.1 } else { 1.1 };
                ws
            }
            ShapeKind::Pow => base * base * base * 20.0 + 0.0001,
            ShapeKind::Sine => {
                let ws = base * base * base * 32.0 + 0.0001;
                norm = if ws < 1.57 { ws.sin() } else { 1.0 };
                ws
            }
            ShapeKind::Quantisize => base * base + 0.000_001,
            ShapeKind::Zigzag => {
                let ws = base * base * base * 32.0 + 0.0001;
                norm = if ws < 1.0 { ws.sin() } else { 1.0 };
                ws
            }
            ShapeKind::Limiter | ShapeKind::UpperLimiter | ShapeKind::LowerLimiter => {
                2f32.powf(-base * base * 8.0)
            }
            ShapeKind::InverseLimiter => (2f32.powf(base * 6.0) - 1.0) / 64.0,
            ShapeKind::Clip => 5f32.powf(base * base) - 1.0,
            ShapeKind::Asym2 => {
                let ws = base * base * base * 30.0 + 0.001;
                norm = if ws < 0.3 { ws } else { 1.0 };
                ws
            }
            ShapeKind::Pow2 => {
                let ws = base * base * base * 32.0 + 0.0001;
                norm = if ws < 1.0 { ws * (1.0 + ws) / 2.0 } else { 1.0 };
                ws
            }
            ShapeKind::Sigmoid => {
                let ws = base.powi(5) * 80.0 + 0.0001;
                norm = if ws > 10.0 {
                    0.5
                } else {
                    0.5 - 1.0 / (ws.exp() + 1.0)
                };
                ws
            }
            ShapeKind::SqrtCrunch | ShapeKind::SqrtCrunch2 => base * base * CRUNCH_GAIN + 1.0,
            ShapeKind::OctaveUp => base * base * 30.0 + 1.0,
            ShapeKind::Asymmetric2 | ShapeKind::Asymmetric3 => {
                let offset = if kind == ShapeKind::Asymmetric2 {
                    0.000_01
                } else {
                    0.0001
                };
                let ws = base * TWO_PI + offset;
                norm = if ws < 1.57 { ws.sin() } else { 1.0 };
                ws
            }
            ShapeKind::Compression => {
                ratio = 1.0 - 0.25 * base;
                1.5 * base * CRUNCH_GAIN + 4.0
            }
            ShapeKind::Soft => 4f32.powf(base * base + 1.0),
            ShapeKind::SuperSoft => {
                let ws = 20f32.powf(base * base) + 0.5;
                norm = 1.0 / ws;
                ws
            }
            ShapeKind::HardCompression => {
                ratio = 0.05;
                if with_gain {
                    1.5 * base * CRUNCH_GAIN + 1.0
                } else {
                    1.0
                }
            }
            ShapeKind::OpAmpLimiting => {
                ratio = 0.05;
                1.0
            }
            ShapeKind::Jfet => {
                let ws = 35f32.powf(base * base) + 4.0;
                norm = (1.0 / ws).sqrt();
                ws
            }
            ShapeKind::DynoJfet => 85f32.powf(base * base) + 10.0,
            ShapeKind::Valve1 => 4f32.powf(base * base) - 0.98,
            ShapeKind::Valve2 => 110f32.powf(base),
            ShapeKind::DiodeClipper => 5.0 + 110f32.powf(base),
        };

        Self {
            kind,
            drive,
            ws,
            norm,
            ratio,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn drive(&self) -> u8 {
        self.drive
    }
}

/// Waveshaper with the cross-call state of its dynamic shapes.
///
/// ```
/// use klangwerk::dsp::{ShapeKind, WaveShaper};
///
/// let mut shaper = WaveShaper::new();
/// let mut block = [0.9f32, -0.9, 0.1, -0.1];
/// shaper.apply(&mut block, ShapeKind::Arctangent, 100);
/// assert!(block.iter().all(|s| s.abs() <= 1.0));
/// ```
#[derive(Clone, Debug)]
pub struct WaveShaper {
    compg: f32,
    dthresh: f32,
    dyno: f32,
    dyno_decay: f32,
    v_dyno: f32,
    v2_dyno: f32,
    vg2: f32,
    v2_out: f32,
    two_bias_current: f32,
    prepared: Option<PreparedShape>,
}

impl Default for WaveShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveShaper {
    pub fn new() -> Self {
        Self {
            compg: 0.0,
            dthresh: 0.25,
            dyno: 0.0,
            dyno_decay: DYNO_DECAY,
            v_dyno: 0.0,
            v2_dyno: 0.0,
            vg2: MU * V2_BIAS,
            v2_out: 0.0,
            two_bias_current: 105.0 / (PLATE_R * (V2_BIAS * MU).powf(1.5)),
            prepared: None,
        }
    }

    /// Shape `buffer` in place with `kind` at `drive` (0..=127).
    ///
    /// The drive mapping is cached between calls with the same arguments.
    pub fn apply(&mut self, buffer: &mut [f32], kind: ShapeKind, drive: u8) {
        let prepared = match self.prepared {
            Some(p) if p.kind == kind && p.drive == drive.min(127) => p,
            _ => {
                let p = PreparedShape::new(kind, drive, true);
                self.prepared = Some(p);
                p
            }
        };
        for sample in buffer.iter_mut() {
            *sample = self.shape(*sample, &prepared);
        }
    }

    /// Shape one sample.
    pub fn shape(&mut self, x: f32, p: &PreparedShape) -> f32 {
        let ws = p.ws;
        match p.kind {
            ShapeKind::Arctangent => (x * ws).atan() / ws.atan(),
            ShapeKind::Asymmetric => (x * (0.1 + ws - ws * x)).sin() / p.norm,
            ShapeKind::Pow => {
                let t = x * ws;
                if t.abs() < 1.0 {
                    let t = (t - t * t * t) * 3.0;
                    if ws < 1.0 {
                        t / ws
                    } else {
                        t
                    }
                } else {
                    0.0
                }
            }
            ShapeKind::Sine => (x * ws).sin() / p.norm,
            ShapeKind::Quantisize => (x / ws + 0.15).floor() * ws,
            ShapeKind::Zigzag => (x * ws).sin().asin() / p.norm,
            ShapeKind::Limiter => {
                if x.abs() > ws {
                    if x >= 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                } else {
                    x / ws
                }
            }
            ShapeKind::UpperLimiter => x.min(ws) * 2.0,
            ShapeKind::LowerLimiter => x.max(-ws) * 2.0,
            ShapeKind::InverseLimiter => {
                if x.abs() > ws {
                    if x >= 0.0 {
                        x - ws
                    } else {
                        x + ws
                    }
                } else {
                    0.0
                }
            }
            ShapeKind::Clip => {
                let t = x * (ws + 0.5) * 0.9999;
                t - (0.5 + t).floor()
            }
            ShapeKind::Asym2 => {
                let t = x * ws;
                if t > -2.0 && t < 1.0 {
                    t * (1.0 - t) * (t + 2.0) / p.norm
                } else {
                    0.0
                }
            }
            ShapeKind::Pow2 => {
                let t = x * ws;
                if t > -1.0 && t < 1.618_034 {
                    t * (1.0 - t) / p.norm
                } else if t > 0.0 {
                    -1.0
                } else {
                    -2.0
                }
            }
            ShapeKind::Sigmoid => {
                let t = (x * ws).clamp(-10.0, 10.0);
                (0.5 - 1.0 / (t.exp() + 1.0)) / p.norm
            }
            ShapeKind::SqrtCrunch => {
                let t = x * ws;
                let y = if t < TLO {
                    TLC - (-t * DIV_TLC).sqrt()
                } else if t > THI {
                    THC + (t * DIV_THC).sqrt()
                } else {
                    t
                };
                y.clamp(-1.0, 1.0)
            }
            ShapeKind::SqrtCrunch2 => {
                let t = x * ws;
                let y = if t < TLO {
                    TLC
                } else if t > THI {
                    THC + (t * DIV_THC).sqrt()
                } else {
                    t
                };
                y.clamp(-1.0, 1.0)
            }
            ShapeKind::OctaveUp => (x.abs() * ws).min(1.0),
            ShapeKind::Asymmetric2 => (ws * x + (ws * 2.0 * x).sin()).sin() / p.norm,
            ShapeKind::Asymmetric3 => (ws * x + (ws * x).sin() / p.norm).sin(),
            ShapeKind::Compression => self.compress(x, ws, p.ratio, 0.25, true),
            ShapeKind::HardCompression => self.compress(x, ws, p.ratio, 0.5, false),
            ShapeKind::OpAmpLimiting => self.compress(x, 1.0, p.ratio, 3.5, false),
            ShapeKind::Overdrive => {
                if x > 0.0 {
                    (x * ws).sqrt()
                } else {
                    -(-x * ws).sqrt()
                }
            }
            ShapeKind::Soft => {
                if x > 0.0 {
                    ws * x.powf(SQRT_2)
                } else {
                    -ws * (-x).powf(SQRT_2)
                }
            }
            ShapeKind::SuperSoft => {
                let factor = p.norm;
                let x = x.clamp(-1.0, 1.0);
                let y = if x > factor {
                    let knee = (x - factor) / (1.0 - x).max(1e-6);
                    factor + (x - factor) / ((1.0 + knee) * (1.0 + knee))
                } else {
                    x
                };
                y * ws
            }
            ShapeKind::Jfet => {
                let t = (x + p.norm).max(0.0);
                1.0 - 2.0 / (ws * t * t + 1.0)
            }
            ShapeKind::DynoJfet => {
                let level = x.abs();
                if level > 0.15 {
                    self.dyno += (1.0 - self.dyno_decay) * level;
                }
                self.dyno *= self.dyno_decay;
                let t = (x + ((1.0 + 0.05 * self.dyno) / ws).sqrt()).max(0.0);
                1.0 - 2.0 / (ws * t * t + 1.0)
            }
            ShapeKind::Valve1 => {
                let mut vg = V_GRID_BIAS + ws * x - 0.1 * self.v_dyno;
                if vg <= 0.05 {
                    vg = 0.05 / (-20.0 * vg + 2.0);
                }
                let ip = BIAS_CURRENT * vg.powf(V_FACTOR);
                let plate = V_SUPPLY - (V_MIN - V_MIN / (PLATE_R * ip + 1.0));
                let y = (plate - 106.243) / 100.0;
                self.v_dyno += (1.0 - self.dyno_decay) * y;
                self.v_dyno *= self.dyno_decay;
                y
            }
            ShapeKind::Valve2 => {
                self.vg2 = MU * (V2_BIAS + self.v2_dyno + ws * x);
                if self.vg2 <= V_FACT {
                    self.vg2 = V_FACT / (-self.vg2 / V_FACT + 2.0);
                }
                self.v2_out = V_SUPPLY - PLATE_R * self.two_bias_current * self.vg2.powf(1.5);
                if self.v2_out <= F_FACT {
                    self.v2_out = F_FACT / (-self.v2_out / F_FACT + 2.0);
                }
                let y = (self.v2_out - 95.0) * 0.01;
                self.v2_dyno += (1.0 - self.dyno_decay) * y;
                self.v2_dyno *= self.dyno_decay;
                y
            }
            ShapeKind::DiodeClipper => {
                let t = ws * x;
                if t > 0.0 {
                    1.0 - 1.0 / 4f32.powf(t)
                } else {
                    -(1.0 - 1.0 / 4f32.powf(-t))
                }
            }
        }
    }

    /// Envelope-following compressor shared by the three compression shapes.
    /// `floor` is the lowest the dynamic threshold may fall to.
    fn compress(&mut self, x: f32, gain: f32, ratio: f32, floor: f32, with_dyno: bool) -> f32 {
        let mut level = (gain * x).abs();
        if with_dyno {
            self.dyno += 0.01 * (1.0 - self.dyno_decay) * level;
            self.dyno *= self.dyno_decay;
            level += self.dyno;
        }

        let y = if level > self.dthresh {
            self.compg = self.dthresh + self.dthresh * (level - self.dthresh) / level;
            self.dthresh = floor + ratio * (self.compg - self.dthresh);
            if x > 0.0 {
                self.compg
            } else {
                -self.compg
            }
        } else {
            x * gain
        };

        if level < self.dthresh {
            self.dthresh = level;
        }
        if self.dthresh < floor {
            self.dthresh = floor;
        }
        y
    }

    /// Forget the dynamic state of the compression and JFET shapes.
    pub fn cleanup(&mut self) {
        self.compg = 0.0;
        self.dthresh = 0.25;
        self.dyno = 0.0;
        self.dyno_decay = DYNO_DECAY;
    }

    /// [`cleanup`](Self::cleanup) plus the valve feedback terms.
    pub fn reset(&mut self) {
        self.cleanup();
        self.v_dyno = 0.0;
        self.v2_dyno = 0.0;
        self.vg2 = MU * V2_BIAS;
        self.v2_out = 0.0;
    }

    /// Current compression threshold.
    pub fn dynamic_threshold(&self) -> f32 {
        self.dthresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ids_are_stable() {
        for (id, kind) in ShapeKind::ALL.iter().enumerate() {
            assert_eq!(kind.id(), id);
            assert_eq!(ShapeKind::from_id(id), Some(*kind));
        }
        assert_eq!(ShapeKind::from_id(NUM_SHAPE_KINDS), None);
        assert_eq!(ShapeKind::Compression.id(), 19);
        assert_eq!(ShapeKind::DiodeClipper.name(), "Diode Clipper");
    }

    #[test]
    fn every_shape_stays_finite() {
        let input: Vec<f32> = (0..1000)
            .map(|i| (i as f32 * 0.731).sin() * if i % 7 == 0 { 1.0 } else { 0.8 })
            .collect();
        for kind in ShapeKind::ALL {
            let mut shaper = WaveShaper::new();
            for drive in 0..=127u8 {
                let mut block = input.clone();
                shaper.apply(&mut block, kind, drive);
                assert!(
                    block.iter().all(|s| s.is_finite()),
                    "{} at drive {drive}",
                    kind.name()
                );
            }
        }
    }

    #[test]
    fn extreme_inputs_stay_finite() {
        for kind in ShapeKind::ALL {
            let mut shaper = WaveShaper::new();
            let mut block = [1.0, -1.0, 0.0, 1.0, 1.0, -1.0, -1.0];
            shaper.apply(&mut block, kind, 127);
            assert!(block.iter().all(|s| s.is_finite()), "{}", kind.name());
        }
    }

    #[test]
    fn clamping_shapes_stay_in_unit_range() {
        let clamped = [
            ShapeKind::Arctangent,
            ShapeKind::Limiter,
            ShapeKind::SqrtCrunch,
            ShapeKind::SqrtCrunch2,
            ShapeKind::OctaveUp,
            ShapeKind::DiodeClipper,
        ];
        for kind in clamped {
            let mut shaper = WaveShaper::new();
            let mut block: Vec<f32> = (0..500).map(|i| (i as f32 * 0.05).sin()).collect();
            shaper.apply(&mut block, kind, 127);
            assert!(block.iter().all(|s| s.abs() <= 1.0 + 1e-6), "{}", kind.name());
        }
    }

    #[test]
    fn arctangent_is_odd_and_unity_at_full_scale() {
        let mut shaper = WaveShaper::new();
        let mut block = [1.0, -1.0, 0.5, -0.5];
        shaper.apply(&mut block, ShapeKind::Arctangent, 64);
        assert_abs_diff_eq!(block[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(block[1], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(block[2], -block[3], epsilon = 1e-6);
    }

    #[test]
    fn compression_state_carries_across_calls() {
        let loud: Vec<f32> = (0..256).map(|i| (i as f32 * 0.2).sin()).collect();
        let quiet: Vec<f32> = loud.iter().map(|s| s * 0.1).collect();

        let mut warmed = WaveShaper::new();
        let mut block = loud.clone();
        warmed.apply(&mut block, ShapeKind::Compression, 90);
        let mut after_loud = quiet.clone();
        warmed.apply(&mut after_loud, ShapeKind::Compression, 90);

        let mut fresh = WaveShaper::new();
        let mut cold = quiet.clone();
        fresh.apply(&mut cold, ShapeKind::Compression, 90);

        assert_ne!(after_loud, cold);

        warmed.cleanup();
        let mut after_cleanup = quiet;
        warmed.apply(&mut after_cleanup, ShapeKind::Compression, 90);
        assert_eq!(after_cleanup, cold);
    }

    #[test]
    fn dynamic_decay_uses_fixed_44k1_reference() {
        // the decay is independent of any engine sample rate
        assert_abs_diff_eq!(DYNO_DECAY, 0.998_644, epsilon = 1e-5);
        let shaper = WaveShaper::new();
        assert_eq!(shaper.dyno_decay, DYNO_DECAY);
    }

    #[test]
    fn threshold_never_drops_below_floor() {
        let mut shaper = WaveShaper::new();
        let mut block: Vec<f32> = (0..2000).map(|i| (i as f32 * 0.01).sin() * 0.01).collect();
        shaper.apply(&mut block, ShapeKind::HardCompression, 127);
        assert!(shaper.dynamic_threshold() >= 0.5);
    }

    #[test]
    fn drive_above_127_is_clamped() {
        let a = PreparedShape::new(ShapeKind::Soft, 200, true);
        let b = PreparedShape::new(ShapeKind::Soft, 127, true);
        assert_eq!(a, b);
    }
}
