//! Stereo distortion node

use dasp_graph::{Buffer, Input};

use crate::dsp::{Distortion, Signal, SignalProcessorStereo, PRESETS};
use crate::error::Error;
use crate::node::{input_channels, mix_inputs, AudioNode, ProcessContext};

/// Messages to control a [`Distorter`]
#[derive(Clone, Copy, Debug)]
pub enum DistortionMessage {
    SetPreset(usize),
    /// Set one parameter, see [`params`](crate::dsp::params)
    ChangeParam { index: usize, value: i32 },
    Cleanup,
}

/// Runs a [`Distortion`] with two output channels.
///
/// Mono inputs are fed as a single channel, wider inputs as a left/right pair.
pub struct Distorter {
    fx: Distortion,
}

impl Distorter {
    pub fn new(sample_rate: f32) -> Result<Self, Error> {
        Ok(Self {
            fx: Distortion::new(sample_rate)?,
        })
    }

    pub fn with_preset(mut self, index: usize) -> Self {
        if self.fx.set_preset(index) {
            tracing::debug!(preset = PRESETS[index].name, "distortion preset applied");
        } else {
            tracing::warn!(index, "unknown distortion preset");
        }
        self
    }

    pub fn distortion(&self) -> &Distortion {
        &self.fx
    }
}

impl From<Distortion> for Distorter {
    fn from(fx: Distortion) -> Self {
        Self { fx }
    }
}

impl AudioNode for Distorter {
    type Message = DistortionMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = DistortionMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                DistortionMessage::SetPreset(index) => {
                    self.fx.set_preset(index);
                }
                DistortionMessage::ChangeParam { index, value } => {
                    self.fx.change_param(index, value)
                }
                DistortionMessage::Cleanup => self.fx.cleanup(),
            }
        }

        let [left, right, ..] = outputs else {
            return;
        };
        mix_inputs(inputs, 0, left);
        if input_channels(inputs) <= 1 {
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let out = self.fx.process_signal(Signal::mono(*l));
                (*l, *r) = (out.left(), out.right());
            }
        } else {
            mix_inputs(inputs, 1, right);
            self.fx.out(left, right);
        }
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        2
    }
}
