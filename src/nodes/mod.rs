//! Built-in audio nodes.
//!
//! Nodes are organized into three categories:
//!
//! ## Sources ([`source`])
//!
//! Generate audio with no audio inputs:
//! - [`Oscillator`] - Wavetable oscillator
//! - [`SamplePlayer`] - Play a loaded sample at any speed, looped or one-shot
//! - [`Voice`] - Oscillator, envelope and ladder filter played by note messages
//!
//! ## Effects ([`effect`])
//!
//! Process audio (inputs summed, then transformed):
//! - [`Envelope`] - ADSR gain, or the bare envelope level when unconnected
//! - [`Filter`] - Analog low/high-pass cascade or 4-pole ladder
//! - [`Distorter`] - Waveshaping distortion with presets (stereo out)
//! - [`Panner`] - Stereo placement (stereo out)
//!
//! ## Sinks ([`sink`])
//!
//! - [`RingSink`] - Write interleaved blocks to a ring buffer (the engine's output)
//!
//! Every node has a message type for runtime parameter control, e.g.
//! [`OscillatorMessage`] or [`DistortionMessage`]. The sink uses `()`.

pub mod effect;
pub mod sink;
pub mod source;

pub use effect::{
    Distorter, DistortionMessage, Envelope, EnvelopeMessage, Filter, FilterMessage, PanMessage,
    Panner,
};
pub use sink::RingSink;
pub use source::{
    Oscillator, OscillatorMessage, SamplePlayer, SamplerMessage, Voice, VoiceMessage,
};
