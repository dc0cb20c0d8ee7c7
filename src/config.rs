//! Engine configuration supplied by the host at start-up.

use crate::error::Error;

/// Sample rate used when nothing else is configured.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Host block size used when nothing else is configured.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Output channels supported by the block renderer.
pub const MAX_OUTPUT_CHANNELS: usize = 2;

/// Audio engine configuration.
///
/// ```
/// use klangwerk::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_sample_rate(48_000.0)
///     .with_block_size(256)
///     .with_channels(1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Sample rate in Hz
    pub sample_rate: f32,
    /// Frames per host block
    pub block_size: usize,
    /// Output channels (1 or 2)
    pub channels: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            channels: 2,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Check the configuration before any buffer is allocated.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        if self.channels == 0 || self.channels > MAX_OUTPUT_CHANNELS {
            return Err(Error::InvalidChannelCount {
                channels: self.channels,
                max: MAX_OUTPUT_CHANNELS,
            });
        }
        Ok(())
    }
}
