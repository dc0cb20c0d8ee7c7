//! Klangwerk - real-time synthesis and effects on a message-driven audio graph
//!
//! Design principles:
//! - Each engine has a fixed sample rate, block size and channel count
//! - DSP blocks in [`dsp`] are plain per-sample structs: no allocation, no errors
//! - Graph nodes receive parameters via message ring buffers, not shared state
//! - No Arc, no locks on the audio thread
//! - The host pulls interleaved blocks of any size with [`Engine::render`]
//!
//! ```
//! use klangwerk::{Engine, EngineConfig};
//! use klangwerk::dsp::{LadderLowPass, Waveform};
//! use klangwerk::nodes::{Distorter, DistortionMessage, Filter, Oscillator};
//!
//! let config = EngineConfig::default();
//! let mut engine = Engine::new(config).unwrap();
//!
//! let osc = engine.add(Oscillator::new(Waveform::Sawtooth, 110.0, config.sample_rate));
//! let filter = engine.add(Filter::ladder(LadderLowPass::new(800.0, 0.4, config.sample_rate).unwrap()));
//! let mut drive = engine.add(Distorter::new(config.sample_rate).unwrap());
//! engine.connect(&osc, &filter).unwrap();
//! engine.connect(&filter, &drive).unwrap();
//! engine.output(&drive).unwrap();
//!
//! drive.send(DistortionMessage::SetPreset(3)).ok();
//!
//! let mut block = vec![0.0; config.block_size * config.channels];
//! engine.render(&mut block);
//! ```

extern crate alloc;

mod engine;
mod graph;
mod node;

pub mod config;
pub mod dsp;
pub mod error;
pub mod nodes;

#[cfg(feature = "cpal_sink")]
mod device;

pub use config::EngineConfig;
pub use engine::{Engine, Handle};
pub use error::Error;
pub use node::{input_channels, mix_inputs, AudioNode, NodeId, ProcessContext, BLOCK_SIZE};

#[cfg(feature = "cpal_sink")]
pub use device::{CpalDevice, Playback};
