//! Stereo panner node

use dasp_graph::{Buffer, Input};

use crate::dsp::{Pan, PanLaw, Signal, SignalProcessorStereo};
use crate::node::{input_channels, mix_inputs, AudioNode, ProcessContext};

/// Messages to control a [`Panner`]
#[derive(Clone, Copy, Debug)]
pub enum PanMessage {
    /// Position in `[-1, 1]`, left to right
    SetPanning(f32),
    SetLaw(PanLaw),
}

/// Places a mono input in the stereo field, or balances a stereo one.
pub struct Panner {
    pan: Pan,
}

impl Panner {
    pub fn new(law: PanLaw) -> Self {
        Self { pan: Pan::new(law) }
    }

    pub fn with_panning(mut self, panning: f32) -> Self {
        self.pan.set_panning(panning);
        self
    }

    pub fn pan(&self) -> &Pan {
        &self.pan
    }
}

impl Default for Panner {
    fn default() -> Self {
        Self::new(PanLaw::default())
    }
}

impl AudioNode for Panner {
    type Message = PanMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = PanMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                PanMessage::SetPanning(p) => self.pan.set_panning(p),
                PanMessage::SetLaw(law) => self.pan.set_law(law),
            }
        }

        let [left, right, ..] = outputs else {
            return;
        };
        mix_inputs(inputs, 0, left);
        let mono = input_channels(inputs) <= 1;
        if !mono {
            mix_inputs(inputs, 1, right);
        }
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let frame = if mono {
                Signal::mono(*l)
            } else {
                Signal::stereo(*l, *r)
            };
            let out = self.pan.process_signal(frame);
            (*l, *r) = (out.left(), out.right());
        }
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        2
    }
}
