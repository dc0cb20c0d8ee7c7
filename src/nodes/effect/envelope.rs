//! ADSR envelope node

use dasp_graph::{Buffer, Input};

use crate::dsp::{Adsr, SignalProcessor, SignalSource};
use crate::node::{fan_out, mix_inputs, AudioNode, ProcessContext};

/// Messages to control an [`Envelope`]
#[derive(Clone, Copy, Debug)]
pub enum EnvelopeMessage {
    /// Gate on: enter the attack stage
    Start,
    /// Gate off: enter the release stage
    Stop,
    SetAdsr {
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    },
    /// Drop straight to idle
    Reset,
}

/// Applies an [`Adsr`] to its input.
///
/// With nothing connected the node emits the envelope level itself, which
/// makes it usable as a control source.
pub struct Envelope {
    adsr: Adsr,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            adsr: Adsr::new(sample_rate),
        }
    }

    pub fn adsr(&self) -> &Adsr {
        &self.adsr
    }
}

impl From<Adsr> for Envelope {
    fn from(adsr: Adsr) -> Self {
        Self { adsr }
    }
}

impl AudioNode for Envelope {
    type Message = EnvelopeMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = EnvelopeMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                EnvelopeMessage::Start => self.adsr.start(),
                EnvelopeMessage::Stop => self.adsr.stop(),
                EnvelopeMessage::SetAdsr {
                    attack,
                    decay,
                    sustain,
                    release,
                } => self.adsr.set_adsr(attack, decay, sustain, release),
                EnvelopeMessage::Reset => self.adsr.reset(),
            }
        }

        let Some(first) = outputs.first_mut() else {
            return;
        };
        if inputs.is_empty() {
            SignalSource::out(&mut self.adsr, first);
        } else {
            mix_inputs(inputs, 0, first);
            self.adsr.process_block(first);
        }
        fan_out(outputs);
    }

    fn num_inputs(&self) -> usize {
        1
    }
}
