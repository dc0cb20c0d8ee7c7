//! Variable-speed sample playback.

use alloc::vec::Vec;

use super::SignalSource;

/// Plays back a buffer of samples at any speed, in either direction,
/// optionally looping between two bounds.
///
/// Loop bounds always satisfy `in <= out <= len - 1`; every setter clamps
/// before committing. An empty buffer plays silence.
#[derive(Clone, Debug)]
pub struct Sampler {
    data: Vec<f32>,
    sample_rate: f32,
    frequency: f32,
    step: f32,
    position: f32,
    amplitude: f32,
    speed: f32,
    forward: bool,
    looping: bool,
    interpolate: bool,
    loop_in: usize,
    loop_out: usize,
}

impl Sampler {
    pub fn new(data: Vec<f32>, sample_rate: f32) -> Self {
        let mut sampler = Self {
            data,
            sample_rate,
            frequency: 0.0,
            step: 0.0,
            position: 0.0,
            amplitude: 1.0,
            speed: 0.0,
            forward: true,
            looping: false,
            interpolate: false,
            loop_in: 0,
            loop_out: 0,
        };
        sampler.set_speed(1.0);
        sampler.set_in(0);
        sampler.set_out(usize::MAX);
        sampler
    }

    /// Replace the buffer with 32-bit IEEE floats decoded from `bytes`.
    ///
    /// Trailing bytes that do not form a whole sample are ignored. The read
    /// pointer is rewound and the loop bounds reset to the whole buffer.
    pub fn load(&mut self, bytes: &[u8], little_endian: bool) {
        let decode = if little_endian {
            f32::from_le_bytes
        } else {
            f32::from_be_bytes
        };
        let count = bytes.len() / 4;
        if self.data.len() != count {
            self.data = alloc::vec![0.0; count];
        }
        for (sample, chunk) in self.data.iter_mut().zip(bytes.chunks_exact(4)) {
            *sample = decode([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        tracing::debug!(samples = count, little_endian, "sample data loaded");

        self.loop_in = 0;
        self.loop_out = self.last_index();
        self.recompute_step();
        self.rewind();
    }

    /// [`load`](Self::load) with little-endian byte order.
    pub fn load_le(&mut self, bytes: &[u8]) {
        self.load(bytes, true);
    }

    /// Swap in a new buffer, returning the old one.
    pub fn set_data(&mut self, data: Vec<f32>) -> Vec<f32> {
        let old = core::mem::replace(&mut self.data, data);
        let last = self.last_index();
        self.loop_out = self.loop_out.min(last);
        self.loop_in = self.loop_in.min(self.loop_out);
        self.recompute_step();
        self.rewind();
        old
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Clamped to `out`.
    pub fn set_in(&mut self, loop_in: usize) {
        self.loop_in = loop_in.min(self.loop_out);
    }

    /// Clamped to `[in, len - 1]`.
    pub fn set_out(&mut self, loop_out: usize) {
        self.loop_out = loop_out.min(self.last_index()).max(self.loop_in);
    }

    pub fn get_in(&self) -> usize {
        self.loop_in
    }

    pub fn get_out(&self) -> usize {
        self.loop_out
    }

    /// Playback speed; 1.0 is the recorded rate, negative plays backwards.
    /// Non-finite speeds are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            return;
        }
        self.speed = speed;
        self.forward = speed > 0.0;
        self.recompute_step();
    }

    pub fn get_speed(&self) -> f32 {
        self.speed
    }

    /// Frequency at which the whole buffer repeats.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn enable_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn interpolate_samples(&mut self, interpolate: bool) {
        self.interpolate = interpolate;
    }

    /// Integer part of the read pointer.
    pub fn get_position(&self) -> usize {
        self.position.max(0.0) as usize
    }

    /// Move the read pointer to the start bound for the current direction.
    pub fn rewind(&mut self) {
        self.position = if self.forward {
            self.loop_in as f32
        } else {
            self.loop_out as f32
        };
    }

    fn last_index(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    fn recompute_step(&mut self) {
        let len = self.data.len() as f32;
        if self.data.is_empty() {
            self.frequency = 0.0;
            self.step = 0.0;
            return;
        }
        self.frequency = self.speed.abs() * self.sample_rate / len;
        // frequency * len / sample_rate, without the rounding
        self.step = self.speed.abs();
    }

    /// Map an index outside the loop onto the opposite bound.
    #[inline]
    fn wrap(&self, index: i64) -> usize {
        if index > self.loop_out as i64 {
            self.loop_in
        } else if index < self.loop_in as i64 {
            self.loop_out
        } else {
            index as usize
        }
    }
}

impl SignalSource for Sampler {
    fn output(&mut self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }

        if self.forward {
            self.position += self.step;
        } else {
            self.position -= self.step;
        }

        let index = self.position.floor();
        let i = index as i64;
        let outside = if self.forward {
            i > self.loop_out as i64
        } else {
            i < self.loop_in as i64
        };
        if outside && !self.looping {
            return 0.0;
        }

        let frac = self.position - index;
        let j = self.wrap(i);
        self.position = j as f32 + frac;

        let sample = if self.interpolate {
            let next = self.wrap(j as i64 + 1);
            self.data[j] * (1.0 - frac) + self.data[next] * frac
        } else {
            self.data[j]
        };
        sample * self.amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32 / len as f32).collect()
    }

    #[test]
    fn looping_playback_has_buffer_period() {
        let len = 37;
        let mut sampler = Sampler::new(ramp(len), 44_100.0);
        sampler.enable_loop(true);

        let out: Vec<f32> = (0..len * 4).map(|_| sampler.output()).collect();
        for k in 0..len * 3 {
            assert_abs_diff_eq!(out[k], out[k + len], epsilon = 1e-6);
        }
    }

    #[test]
    fn one_shot_ends_in_silence() {
        let mut sampler = Sampler::new(alloc::vec![1.0; 8], 44_100.0);
        let out: Vec<f32> = (0..16).map(|_| sampler.output()).collect();
        assert!(out[..7].iter().all(|&s| s == 1.0));
        assert!(out[8..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn set_in_never_passes_out() {
        let mut sampler = Sampler::new(ramp(100), 44_100.0);
        sampler.set_out(40);
        sampler.set_in(70);
        assert_eq!(sampler.get_in(), 40);
        assert_eq!(sampler.get_out(), 40);

        sampler.set_out(10);
        assert_eq!(sampler.get_out(), 40);
        sampler.set_out(1000);
        assert_eq!(sampler.get_out(), 99);
    }

    #[test]
    fn reverse_playback_walks_down() {
        let mut sampler = Sampler::new(ramp(10), 44_100.0);
        sampler.set_speed(-1.0);
        sampler.rewind();
        assert_eq!(sampler.get_position(), 9);
        let first = sampler.output();
        let second = sampler.output();
        assert!(second < first);
    }

    #[test]
    fn fractional_phase_survives_the_wrap() {
        let mut sampler = Sampler::new(ramp(4), 44_100.0);
        sampler.enable_loop(true);
        sampler.interpolate_samples(true);
        sampler.set_speed(1.5);
        sampler.rewind();
        for _ in 0..3 {
            sampler.output();
        }
        // 4.5 wraps to 0.5
        assert_abs_diff_eq!(sampler.position, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn load_decodes_both_byte_orders() {
        let values = [0.5f32, -0.25, 1.0];
        let le: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let be: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();

        let mut sampler = Sampler::new(Vec::new(), 44_100.0);
        sampler.load(&le, true);
        assert_eq!(sampler.data(), &values);
        assert_eq!(sampler.get_out(), 2);

        sampler.load(&be[..11], false);
        assert_eq!(sampler.data(), &values[..2]);
        assert_eq!(sampler.get_out(), 1);
    }

    #[test]
    fn empty_buffer_is_silent() {
        let mut sampler = Sampler::new(Vec::new(), 44_100.0);
        sampler.enable_loop(true);
        assert_eq!(sampler.output(), 0.0);
        assert_eq!(sampler.get_in(), 0);
        assert_eq!(sampler.get_out(), 0);
    }

    #[test]
    fn nan_speed_keeps_the_previous_speed() {
        let mut sampler = Sampler::new(ramp(64), 44_100.0);
        sampler.enable_loop(true);
        sampler.set_speed(f32::NAN);
        assert_eq!(sampler.get_speed(), 1.0);
        sampler.set_speed(1.0);
        let out: Vec<f32> = (0..32).map(|_| sampler.output()).collect();
        assert!(sampler.position.is_finite());
        assert!(out.windows(2).any(|w| w[0] != w[1]));
    }
}
