//! Per-sample DSP building blocks.
//!
//! Everything in here runs on the audio thread: no allocation once built, no
//! locks and no errors. Each block exposes a per-sample entry point and a
//! per-block convenience that is defined as N sequential per-sample calls, so
//! the two are interchangeable sample for sample.

mod distortion;
mod envelope;
mod filter;
mod instrument;
mod ladder;
mod note;
mod pan;
mod sampler;
mod signal;
mod wavetable;
mod waveshaper;

pub use distortion::{params, Distortion, Preset, NUM_PARAMS, NUM_PRESETS, PRESETS};
pub use envelope::{Adsr, AdsrStage};
pub use filter::{AnalogFilter, FilterKind, MAX_FILTER_STAGES};
pub use instrument::Instrument;
pub use ladder::LadderLowPass;
pub use note::note_to_frequency;
pub use pan::{Pan, PanLaw};
pub use sampler::Sampler;
pub use signal::{Signal, LEFT, MAX_CHANNELS, RIGHT};
pub use wavetable::{fill, Waveform, Wavetable, DEFAULT_TABLE_SIZE};
pub use waveshaper::{PreparedShape, ShapeKind, WaveShaper, NUM_SHAPE_KINDS};

/// Anything that generates a signal on its own (oscillators, sample players).
pub trait SignalSource {
    /// Produce the next sample.
    fn output(&mut self) -> f32;

    /// Fill `buffer` with the next `buffer.len()` samples.
    fn out(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.output();
        }
    }
}

/// A mono processor that maps one input sample to one output sample.
#[enum_delegate::register]
pub trait SignalProcessor {
    /// Process a single sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process `buffer` in place.
    fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// A processor that works on whole multi-channel frames.
pub trait SignalProcessorStereo {
    fn process_signal(&mut self, input: Signal) -> Signal;
}

/// The closed set of filters a graph node can host.
#[enum_delegate::implement(SignalProcessor)]
pub enum AnyFilter {
    Analog(AnalogFilter),
    Ladder(LadderLowPass),
}

impl AnyFilter {
    pub fn set_frequency(&mut self, frequency: f32) {
        match self {
            AnyFilter::Analog(f) => f.set_frequency(frequency),
            AnyFilter::Ladder(f) => f.set_frequency(frequency),
        }
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        match self {
            AnyFilter::Analog(f) => f.set_q(resonance),
            AnyFilter::Ladder(f) => f.set_resonance(resonance),
        }
    }

    pub fn cleanup(&mut self) {
        match self {
            AnyFilter::Analog(f) => f.cleanup(),
            AnyFilter::Ladder(f) => f.cleanup(),
        }
    }
}
