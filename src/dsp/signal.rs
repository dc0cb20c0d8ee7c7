//! Fixed-arity multi-channel sample frames.

use crate::error::Error;

/// Upper bound on channels per frame. Frames live on the stack.
pub const MAX_CHANNELS: usize = 8;

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// One sample per channel.
///
/// The channel count is fixed when the frame is created. Indices 0 and 1 are
/// left and right for stereo frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Signal {
    samples: [f32; MAX_CHANNELS],
    channels: usize,
}

impl Signal {
    /// A silent frame with `channels` channels.
    pub fn new(channels: usize) -> Result<Self, Error> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(Error::InvalidChannelCount {
                channels,
                max: MAX_CHANNELS,
            });
        }
        Ok(Self {
            samples: [0.0; MAX_CHANNELS],
            channels,
        })
    }

    pub fn mono(sample: f32) -> Self {
        let mut samples = [0.0; MAX_CHANNELS];
        samples[0] = sample;
        Self { samples, channels: 1 }
    }

    pub fn stereo(left: f32, right: f32) -> Self {
        let mut samples = [0.0; MAX_CHANNELS];
        samples[LEFT] = left;
        samples[RIGHT] = right;
        Self { samples, channels: 2 }
    }

    /// Build a frame from a slice; the slice length is the channel count.
    pub fn from_slice(samples: &[f32]) -> Result<Self, Error> {
        let mut signal = Self::new(samples.len())?;
        signal.samples[..samples.len()].copy_from_slice(samples);
        Ok(signal)
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// Sample of `channel`, or 0.0 for channels the frame does not have.
    #[inline]
    pub fn get(&self, channel: usize) -> f32 {
        if channel < self.channels {
            self.samples[channel]
        } else {
            0.0
        }
    }

    /// Writes to channels the frame does not have are ignored.
    #[inline]
    pub fn set(&mut self, channel: usize, sample: f32) {
        if channel < self.channels {
            self.samples[channel] = sample;
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.samples[LEFT]
    }

    /// Right channel. A mono frame answers with its only sample.
    #[inline]
    pub fn right(&self) -> f32 {
        if self.channels > 1 {
            self.samples[RIGHT]
        } else {
            self.samples[LEFT]
        }
    }

    /// Average of all channels.
    pub fn mix_down(&self) -> f32 {
        self.as_slice().iter().sum::<f32>() / self.channels as f32
    }

    /// Multiply every channel by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for sample in self.as_mut_slice() {
            *sample *= gain;
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples[..self.channels]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.samples[..self.channels]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_count_is_fixed() {
        let mut s = Signal::new(3).unwrap();
        s.set(2, 0.5);
        s.set(5, 1.0);
        assert_eq!(s.num_channels(), 3);
        assert_eq!(s.get(2), 0.5);
        assert_eq!(s.get(5), 0.0);
    }

    #[test]
    fn rejects_invalid_channel_counts() {
        assert!(Signal::new(0).is_err());
        assert!(Signal::new(MAX_CHANNELS + 1).is_err());
        assert!(Signal::from_slice(&[0.1; MAX_CHANNELS]).is_ok());
    }

    #[test]
    fn mono_right_mirrors_left() {
        let s = Signal::mono(0.25);
        assert!(s.is_mono());
        assert_eq!(s.right(), 0.25);
        let st = Signal::stereo(0.1, -0.1);
        assert!(st.is_stereo());
        assert_eq!(st.mix_down(), 0.0);
    }
}
