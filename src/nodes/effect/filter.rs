//! Filter node hosting either the biquad cascade or the ladder

use dasp_graph::{Buffer, Input};

use crate::dsp::{AnalogFilter, AnyFilter, LadderLowPass, SignalProcessor};
use crate::node::{fan_out, mix_inputs, AudioNode, ProcessContext};

/// Messages to control a [`Filter`]
#[derive(Clone, Copy, Debug)]
pub enum FilterMessage {
    /// Cutoff in Hz
    SetFrequency(f32),
    /// Q for the analog filter, `[0, 1]` resonance for the ladder
    SetResonance(f32),
    /// Clear the filter history
    Cleanup,
}

/// A mono filter. Inputs are summed before filtering.
pub struct Filter {
    filter: AnyFilter,
}

impl Filter {
    pub fn new(filter: AnyFilter) -> Self {
        Self { filter }
    }

    pub fn analog(filter: AnalogFilter) -> Self {
        Self::new(AnyFilter::Analog(filter))
    }

    pub fn ladder(filter: LadderLowPass) -> Self {
        Self::new(AnyFilter::Ladder(filter))
    }
}

impl AudioNode for Filter {
    type Message = FilterMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = FilterMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                FilterMessage::SetFrequency(f) => self.filter.set_frequency(f),
                FilterMessage::SetResonance(r) => self.filter.set_resonance(r),
                FilterMessage::Cleanup => self.filter.cleanup(),
            }
        }

        let Some(first) = outputs.first_mut() else {
            return;
        };
        mix_inputs(inputs, 0, first);
        self.filter.process_block(first);
        fan_out(outputs);
    }

    fn num_inputs(&self) -> usize {
        1
    }
}
