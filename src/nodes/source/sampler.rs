//! Sample playback node

use alloc::vec::Vec;

use dasp_graph::{Buffer, Input};

use crate::dsp::{Sampler, SignalSource};
use crate::node::{fan_out, AudioNode, ProcessContext};

/// Messages to control a [`SamplePlayer`]
#[derive(Debug)]
pub enum SamplerMessage {
    /// Playback speed; negative plays backwards
    SetSpeed(f32),
    SetAmplitude(f32),
    SetIn(usize),
    SetOut(usize),
    SetLoop(bool),
    Interpolate(bool),
    Rewind,
    /// Replace the sample data. The previous buffer is freed on the audio thread.
    SetData(Vec<f32>),
}

/// Plays a [`Sampler`] into the graph (mono source)
pub struct SamplePlayer {
    sampler: Sampler,
}

impl SamplePlayer {
    pub fn new(sampler: Sampler) -> Self {
        Self { sampler }
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}

impl From<Sampler> for SamplePlayer {
    fn from(sampler: Sampler) -> Self {
        Self::new(sampler)
    }
}

impl AudioNode for SamplePlayer {
    type Message = SamplerMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = SamplerMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                SamplerMessage::SetSpeed(s) => self.sampler.set_speed(s),
                SamplerMessage::SetAmplitude(a) => self.sampler.set_amplitude(a),
                SamplerMessage::SetIn(i) => self.sampler.set_in(i),
                SamplerMessage::SetOut(o) => self.sampler.set_out(o),
                SamplerMessage::SetLoop(on) => self.sampler.enable_loop(on),
                SamplerMessage::Interpolate(on) => self.sampler.interpolate_samples(on),
                SamplerMessage::Rewind => self.sampler.rewind(),
                SamplerMessage::SetData(data) => {
                    let _old = self.sampler.set_data(data);
                }
            }
        }

        let Some(first) = outputs.first_mut() else {
            return;
        };
        self.sampler.out(first);
        fan_out(outputs);
    }
}
