//! Audio source nodes (no audio inputs)

mod instrument;
mod oscillator;
mod sampler;

pub use instrument::{Voice, VoiceMessage};
pub use oscillator::{Oscillator, OscillatorMessage};
pub use sampler::{SamplePlayer, SamplerMessage};
