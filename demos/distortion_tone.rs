//! Offline demo: run a plucked tone through every distortion preset
//!
//! Run with: cargo run --example distortion_tone
//!
//! Renders one second per preset and prints peak and RMS level, so it works
//! without an audio device.

use klangwerk::dsp::{Waveform, PRESETS};
use klangwerk::nodes::{
    Distorter, DistortionMessage, Envelope, EnvelopeMessage, Oscillator, OscillatorMessage,
};
use klangwerk::{Engine, EngineConfig, Error};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = EngineConfig::default();
    let mut engine = Engine::new(config)?;

    let mut osc = engine.add(Oscillator::new(Waveform::Sine, 110.0, config.sample_rate));
    let mut env = engine.add(Envelope::new(config.sample_rate));
    let mut fx = engine.add(Distorter::new(config.sample_rate)?);
    engine.connect(&osc, &env)?;
    engine.connect(&env, &fx)?;
    engine.output(&fx)?;

    env.send(EnvelopeMessage::SetAdsr {
        attack: 0.002,
        decay: 0.3,
        sustain: 0.3,
        release: 0.2,
    })
    .ok();

    let mut block = vec![0.0f32; config.block_size * config.channels];
    let blocks_per_second = (config.sample_rate as usize) / config.block_size;

    for (index, preset) in PRESETS.iter().enumerate() {
        fx.send(DistortionMessage::SetPreset(index)).ok();
        osc.send(OscillatorMessage::Reset).ok();
        env.send(EnvelopeMessage::Start).ok();

        let mut peak = 0.0f32;
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for i in 0..blocks_per_second {
            if i == blocks_per_second / 2 {
                env.send(EnvelopeMessage::Stop).ok();
            }
            engine.render(&mut block);
            for s in &block {
                peak = peak.max(s.abs());
                sum += f64::from(s * s);
            }
            count += block.len();
        }

        let rms = (sum / count as f64).sqrt();
        println!("{:<14} peak {:>6.3}  rms {:>6.3}", preset.name, peak, rms);
    }

    Ok(())
}
