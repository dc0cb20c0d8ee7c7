//! Wavetable oscillator node

use dasp_graph::{Buffer, Input};

use crate::dsp::{SignalSource, Waveform, Wavetable};
use crate::node::{fan_out, AudioNode, ProcessContext};

/// Messages to control an [`Oscillator`]
#[derive(Clone, Copy, Debug)]
pub enum OscillatorMessage {
    SetFrequency(f32),
    /// Jump to a new amplitude
    SetAmplitude(f32),
    /// Glide to a new amplitude over `samples` samples
    RampAmplitude { amplitude: f32, samples: u32 },
    /// Refill the table with another waveform
    SetWaveform(Waveform),
    Interpolate(bool),
    /// Rewind the phase
    Reset,
}

/// A wavetable oscillator (mono source)
pub struct Oscillator {
    wavetable: Wavetable,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        let mut wavetable = Wavetable::new(waveform, crate::dsp::DEFAULT_TABLE_SIZE, sample_rate);
        wavetable.set_frequency(frequency);
        Self { wavetable }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.wavetable.set_amplitude(amplitude);
        self
    }

    pub fn wavetable(&self) -> &Wavetable {
        &self.wavetable
    }
}

impl From<Wavetable> for Oscillator {
    fn from(wavetable: Wavetable) -> Self {
        Self { wavetable }
    }
}

impl AudioNode for Oscillator {
    type Message = OscillatorMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = OscillatorMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                OscillatorMessage::SetFrequency(f) => self.wavetable.set_frequency(f),
                OscillatorMessage::SetAmplitude(a) => self.wavetable.set_amplitude(a),
                OscillatorMessage::RampAmplitude { amplitude, samples } => {
                    self.wavetable.set_amplitude_ramped(amplitude, samples)
                }
                OscillatorMessage::SetWaveform(w) => self.wavetable.set_waveform(w),
                OscillatorMessage::Interpolate(on) => self.wavetable.interpolate_samples(on),
                OscillatorMessage::Reset => self.wavetable.reset(),
            }
        }

        let Some(first) = outputs.first_mut() else {
            return;
        };
        self.wavetable.out(first);
        fan_out(outputs);
    }

    #[inline]
    fn num_outputs(&self) -> usize {
        1
    }
}
