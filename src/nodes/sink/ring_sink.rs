//! Ring buffer sink feeding the host callback

use alloc::vec::Vec;

use dasp_graph::{Buffer, Input};
use rtrb::Producer;

use crate::node::{mix_inputs, AudioNode, ProcessContext};

/// A sink that pushes interleaved audio into an rtrb ring buffer.
///
/// Every connected input is summed per channel; a mono input is copied to
/// all channels. With nothing connected it writes silence, so the reader
/// always receives one block per graph pass. A block that does not fit in
/// the ring is skipped whole rather than split.
pub struct RingSink {
    producer: Producer<f32>,
    channels: usize,
    scratch: Vec<Buffer>,
    skipped_blocks: u64,
}

impl RingSink {
    /// Create a sink that writes interleaved samples to the given producer
    pub fn new(producer: Producer<f32>, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            producer,
            channels,
            scratch: alloc::vec![Buffer::SILENT; channels],
            skipped_blocks: 0,
        }
    }

    pub fn mono(producer: Producer<f32>) -> Self {
        Self::new(producer, 1)
    }

    pub fn stereo(producer: Producer<f32>) -> Self {
        Self::new(producer, 2)
    }

    /// Returns how many sample slots are free
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }

    /// Blocks dropped because the reader fell behind.
    pub fn skipped_blocks(&self) -> u64 {
        self.skipped_blocks
    }
}

impl AudioNode for RingSink {
    type Message = ();

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let frames = Buffer::LEN;
        if self.producer.slots() < frames * self.channels {
            self.skipped_blocks += 1;
            return;
        }

        for (channel, buffer) in self.scratch.iter_mut().enumerate() {
            mix_inputs(inputs, channel, buffer);
        }

        for i in 0..frames {
            for buffer in &self.scratch {
                let _ = self.producer.push(buffer[i]);
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize {
        1
    }

    #[inline]
    fn num_outputs(&self) -> usize {
        0
    }
}
