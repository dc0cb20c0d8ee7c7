//! Core node trait and context types.

use dasp_graph::{Buffer, Input};

/// Frames per graph block. Fixed by `dasp_graph`'s buffer type.
pub const BLOCK_SIZE: usize = Buffer::LEN;

/// Information available during audio processing.
///
/// Passed to every [`AudioNode::process`] call.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the graph in Hz
    pub sample_rate: f32,
    /// Frames per buffer (always [`BLOCK_SIZE`])
    pub buffer_size: usize,
}

/// Unique identifier for a node within a graph.
///
/// You typically don't interact with this directly - use [`Handle`](crate::Handle) instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

/// A block-based processing node.
///
/// Nodes come in three shapes:
/// - **Sources** generate audio (0 inputs) - oscillators, samplers, voices
/// - **Effects** transform audio (1 input) - envelopes, filters, distortion, panning
/// - **Sinks** consume audio (0 outputs) - the engine's ring buffer output
///
/// # Message-Based Parameters
///
/// Nodes never share mutable state with the control thread. Parameter changes
/// arrive as messages, drained at the start of each block, so a message is
/// applied whole between two blocks and never in the middle of one:
///
/// ```
/// use klangwerk::{AudioNode, ProcessContext};
/// use dasp_graph::{Buffer, Input};
///
/// enum DcMessage {
///     SetLevel(f32),
/// }
///
/// struct Dc {
///     level: f32,
/// }
///
/// impl AudioNode for Dc {
///     type Message = DcMessage;
///
///     fn process(
///         &mut self,
///         _ctx: &ProcessContext,
///         messages: impl Iterator<Item = DcMessage>,
///         _inputs: &[Input],
///         outputs: &mut [Buffer],
///     ) {
///         for msg in messages {
///             match msg {
///                 DcMessage::SetLevel(level) => self.level = level,
///             }
///         }
///         for sample in outputs[0].iter_mut() {
///             *sample = self.level;
///         }
///     }
/// }
/// ```
///
/// Nodes without parameters use `()` as their message type.
pub trait AudioNode: Send + 'static {
    /// Message type for parameter updates.
    type Message: Send + 'static;

    /// Process one block of [`BLOCK_SIZE`] frames.
    ///
    /// Drain `messages` first, then read `inputs` and fill `outputs`.
    /// Must not allocate, lock or block.
    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    );

    /// Number of audio inputs (0 for sources).
    fn num_inputs(&self) -> usize {
        0
    }

    /// Number of audio output channels.
    fn num_outputs(&self) -> usize {
        1
    }
}

/// Sum `channel` of every input into `out`.
///
/// Inputs with fewer channels contribute their last channel, so a mono
/// source feeds both sides of a stereo node.
pub fn mix_inputs(inputs: &[Input], channel: usize, out: &mut Buffer) {
    out.iter_mut().for_each(|s| *s = 0.0);
    for input in inputs {
        let buffers = input.buffers();
        let Some(source) = buffers.get(channel).or_else(|| buffers.last()) else {
            continue;
        };
        for (o, &s) in out.iter_mut().zip(source.iter()) {
            *o += s;
        }
    }
}

/// Widest channel count among `inputs`.
pub fn input_channels(inputs: &[Input]) -> usize {
    inputs
        .iter()
        .map(|input| input.buffers().len())
        .max()
        .unwrap_or(0)
}

/// Copy the first output buffer into the remaining ones.
pub(crate) fn fan_out(outputs: &mut [Buffer]) {
    if let Some((first, rest)) = outputs.split_first_mut() {
        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }
}
