//! Errors raised while building the engine.
//!
//! Nothing on the audio path returns an error: out-of-range parameters are
//! clamped and missing data plays back as silence. The only failures are
//! structural ones that happen at construction time.

use core::fmt;

#[cfg(feature = "cpal_sink")]
use alloc::string::String;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An analog filter was built with more cascaded stages than it has history for.
    InvalidFilterStages { stages: usize, max: usize },
    /// A signal or engine was configured with an unsupported channel count.
    InvalidChannelCount { channels: usize, max: usize },
    /// The host block size must be at least one frame.
    InvalidBlockSize(usize),
    /// The sample rate must be a positive, finite number.
    InvalidSampleRate(f32),
    /// A handle was passed to an engine that did not create it.
    ForeignHandle,
    /// The connection would close a loop in the graph.
    Cycle,
    /// The output device could not be opened or started.
    #[cfg(feature = "cpal_sink")]
    Device(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFilterStages { stages, max } => {
                write!(f, "filter stages {stages} out of range (max {max})")
            }
            Error::InvalidChannelCount { channels, max } => {
                write!(f, "channel count {channels} out of range (1..={max})")
            }
            Error::InvalidBlockSize(size) => write!(f, "invalid block size {size}"),
            Error::InvalidSampleRate(rate) => write!(f, "invalid sample rate {rate}"),
            Error::ForeignHandle => write!(f, "handle belongs to another engine"),
            Error::Cycle => write!(f, "connection would create a cycle"),
            #[cfg(feature = "cpal_sink")]
            Error::Device(reason) => write!(f, "audio device error: {reason}"),
        }
    }
}

impl std::error::Error for Error {}
