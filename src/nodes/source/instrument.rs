//! Playable voice node

use dasp_graph::{Buffer, Input};

use crate::dsp::{Instrument, SignalSource, Waveform};
use crate::error::Error;
use crate::node::{fan_out, AudioNode, ProcessContext};

/// Messages to play a [`Voice`]
#[derive(Clone, Copy, Debug)]
pub enum VoiceMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff,
    SetWaveform(Waveform),
    SetAdsr {
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    },
    SetFilter { frequency: f32, resonance: f32 },
    SetAmplitude(f32),
    /// Glide the gain to `target` over `samples` sounding samples
    RampAmplitude { target: f32, samples: u32 },
    /// Pitch LFO, `depth` in Hz
    SetVibrato { rate: f32, depth: f32 },
    /// Gain LFO, `depth` in 0..=1
    SetTremolo { rate: f32, depth: f32 },
    /// Silence immediately
    Panic,
}

/// An [`Instrument`] driven by note messages (mono source)
pub struct Voice {
    instrument: Instrument,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Result<Self, Error> {
        Ok(Self {
            instrument: Instrument::new(sample_rate)?,
        })
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }
}

impl From<Instrument> for Voice {
    fn from(instrument: Instrument) -> Self {
        Self { instrument }
    }
}

impl AudioNode for Voice {
    type Message = VoiceMessage;

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        messages: impl Iterator<Item = VoiceMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        let voice = &mut self.instrument;
        for msg in messages {
            match msg {
                VoiceMessage::NoteOn { note, velocity } => voice.note_on(note, velocity),
                VoiceMessage::NoteOff => voice.note_off(),
                VoiceMessage::SetWaveform(w) => voice.set_oscillator_type(w),
                VoiceMessage::SetAdsr {
                    attack,
                    decay,
                    sustain,
                    release,
                } => voice.set_adsr(attack, decay, sustain, release),
                VoiceMessage::SetFilter {
                    frequency,
                    resonance,
                } => {
                    voice.set_filter_frequency(frequency);
                    voice.set_filter_resonance(resonance);
                }
                VoiceMessage::SetAmplitude(a) => voice.set_amplitude(a),
                VoiceMessage::RampAmplitude { target, samples } => {
                    voice.ramp_amplitude(target, samples)
                }
                VoiceMessage::SetVibrato { rate, depth } => voice.set_vibrato(rate, depth),
                VoiceMessage::SetTremolo { rate, depth } => voice.set_tremolo(rate, depth),
                VoiceMessage::Panic => voice.reset(),
            }
        }

        let Some(first) = outputs.first_mut() else {
            return;
        };
        voice.out(first);
        fan_out(outputs);
    }
}
