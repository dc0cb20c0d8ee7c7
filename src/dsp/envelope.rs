//! Attack/decay/sustain/release envelope.

use super::{SignalProcessor, SignalSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdsrStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// A linear ADSR envelope.
///
/// Each ramping stage is counted down in samples. Entering a stage derives a
/// per-sample delta from the *current* level, so a retrigger during release
/// climbs from wherever the level is instead of snapping to zero. A stage
/// with zero length is skipped within the same call.
///
/// As a [`SignalSource`] it outputs the level itself; as a
/// [`SignalProcessor`] it scales its input by the level.
#[derive(Clone, Debug)]
pub struct Adsr {
    stage: AdsrStage,
    level: f32,
    delta: f32,
    target: f32,
    remaining: u32,

    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
    sample_rate: f32,
}

impl Adsr {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stage: AdsrStage::Idle,
            level: 0.0,
            delta: 0.0,
            target: 0.0,
            remaining: 0,
            attack: 0.005,
            decay: 0.25,
            sustain: 0.5,
            release: 0.5,
            sample_rate,
        }
    }

    /// Attack time in seconds.
    pub fn set_attack(&mut self, seconds: f32) {
        self.attack = seconds.max(0.0);
    }

    /// Decay time in seconds.
    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.max(0.0);
    }

    /// Sustain level, clamped to `[0, 1]`. NaN is ignored.
    pub fn set_sustain(&mut self, level: f32) {
        if level.is_nan() {
            return;
        }
        self.sustain = level.clamp(0.0, 1.0);
        if self.stage == AdsrStage::Sustain {
            self.level = self.sustain;
        }
    }

    /// Release time in seconds.
    pub fn set_release(&mut self, seconds: f32) {
        self.release = seconds.max(0.0);
    }

    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.set_attack(attack);
        self.set_decay(decay);
        self.set_sustain(sustain);
        self.set_release(release);
    }

    pub fn stage(&self) -> AdsrStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != AdsrStage::Idle
    }

    /// Note on. Enters attack from the current level.
    pub fn start(&mut self) {
        self.enter(AdsrStage::Attack);
    }

    /// Note off. Ignored when idle or already releasing.
    pub fn stop(&mut self) {
        if matches!(
            self.stage,
            AdsrStage::Attack | AdsrStage::Decay | AdsrStage::Sustain
        ) {
            self.enter(AdsrStage::Release);
        }
    }

    /// Silence immediately.
    pub fn reset(&mut self) {
        self.stage = AdsrStage::Idle;
        self.level = 0.0;
        self.remaining = 0;
    }

    fn samples(&self, seconds: f32) -> u32 {
        (seconds * self.sample_rate).round() as u32
    }

    fn enter(&mut self, mut stage: AdsrStage) {
        loop {
            self.stage = stage;
            let (duration, target, next) = match stage {
                AdsrStage::Idle => {
                    self.level = 0.0;
                    return;
                }
                AdsrStage::Sustain => {
                    self.level = self.sustain;
                    return;
                }
                AdsrStage::Attack => (self.samples(self.attack), 1.0, AdsrStage::Decay),
                AdsrStage::Decay => (self.samples(self.decay), self.sustain, AdsrStage::Sustain),
                AdsrStage::Release => (self.samples(self.release), 0.0, AdsrStage::Idle),
            };

            if duration == 0 {
                self.level = target;
                stage = next;
                continue;
            }

            self.target = target;
            self.remaining = duration;
            self.delta = (target - self.level) / duration as f32;
            return;
        }
    }

    fn next_stage(&self) -> AdsrStage {
        match self.stage {
            AdsrStage::Attack => AdsrStage::Decay,
            AdsrStage::Decay => AdsrStage::Sustain,
            AdsrStage::Sustain => AdsrStage::Sustain,
            AdsrStage::Release | AdsrStage::Idle => AdsrStage::Idle,
        }
    }
}

impl SignalSource for Adsr {
    fn output(&mut self) -> f32 {
        match self.stage {
            AdsrStage::Idle => return 0.0,
            AdsrStage::Sustain => {}
            AdsrStage::Attack | AdsrStage::Decay | AdsrStage::Release => {
                self.level += self.delta;
                self.remaining = self.remaining.saturating_sub(1);
                if self.remaining == 0 {
                    self.level = self.target;
                    let next = self.next_stage();
                    self.enter(next);
                }
            }
        }
        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }
}

impl SignalProcessor for Adsr {
    fn process(&mut self, input: f32) -> f32 {
        input * self.output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn envelope(a: f32, d: f32, s: f32, r: f32) -> Adsr {
        // 1000 Hz keeps sample counts readable
        let mut env = Adsr::new(1000.0);
        env.set_adsr(a, d, s, r);
        env
    }

    #[test]
    fn walks_through_all_stages() {
        let mut env = envelope(0.01, 0.01, 0.5, 0.01);
        assert_eq!(env.output(), 0.0);

        env.start();
        let attack: Vec<f32> = (0..10).map(|_| env.output()).collect();
        assert_abs_diff_eq!(attack[0], 0.1, epsilon = 1e-6);
        assert_eq!(attack[9], 1.0);
        assert_eq!(env.stage(), AdsrStage::Decay);

        for _ in 0..10 {
            env.output();
        }
        assert_eq!(env.stage(), AdsrStage::Sustain);
        assert_eq!(env.output(), 0.5);

        env.stop();
        for _ in 0..10 {
            env.output();
        }
        assert_eq!(env.stage(), AdsrStage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn zero_length_stages_fall_through() {
        let mut env = envelope(0.0, 0.0, 0.3, 0.0);
        env.start();
        assert_eq!(env.stage(), AdsrStage::Sustain);
        assert_eq!(env.output(), 0.3);
        env.stop();
        assert_eq!(env.stage(), AdsrStage::Idle);
        assert_eq!(env.output(), 0.0);
    }

    #[test]
    fn retrigger_during_release_starts_from_current_level() {
        let mut env = envelope(0.01, 0.0, 1.0, 0.01);
        env.start();
        for _ in 0..10 {
            env.output();
        }
        env.stop();
        for _ in 0..5 {
            env.output();
        }
        let before = env.level();
        env.start();
        let after = env.output();
        assert!(after > before);
        assert!(after - before < 0.2);
    }

    #[test]
    fn stop_while_idle_is_ignored() {
        let mut env = envelope(0.01, 0.01, 0.5, 0.01);
        env.stop();
        assert_eq!(env.stage(), AdsrStage::Idle);
    }

    #[test]
    fn level_stays_in_unit_range_under_random_gates() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..50 {
            let mut env = envelope(
                rng.f32() * 0.02,
                rng.f32() * 0.02,
                rng.f32(),
                rng.f32() * 0.02,
            );
            for _ in 0..2000 {
                match rng.u8(..) {
                    0..=4 => env.start(),
                    5..=9 => env.stop(),
                    200 => env.set_sustain(rng.f32() * 2.0 - 0.5),
                    _ => {}
                }
                let level = env.output();
                assert!((0.0..=1.0).contains(&level), "level {level}");
            }
        }
    }

    #[test]
    fn processor_scales_input() {
        let mut env = envelope(0.0, 0.0, 0.25, 0.0);
        env.start();
        assert_eq!(env.process(2.0), 0.5);
    }

    #[test]
    fn nan_sustain_is_ignored() {
        let mut env = envelope(0.0, 0.0, 0.5, 0.01);
        env.start();
        env.output();
        assert_eq!(env.stage(), AdsrStage::Sustain);
        env.set_sustain(f32::NAN);
        for _ in 0..10 {
            let level = env.output();
            assert!((0.0..=1.0).contains(&level), "level {level}");
        }
        assert_eq!(env.output(), 0.5);
    }
}
