//! Play a sawtooth through the ladder filter while sweeping its cutoff
//!
//! Run with: cargo run --example ladder_sweep --features cpal_sink
//!
//! Lists available devices and lets you pick one.

use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use klangwerk::dsp::{LadderLowPass, Waveform};
use klangwerk::nodes::{Filter, FilterMessage, Oscillator};
use klangwerk::{CpalDevice, Engine, Error};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let devices = CpalDevice::list_outputs();
    if devices.is_empty() {
        eprintln!("No audio output devices found!");
        return Ok(());
    }

    println!("Available audio output devices:");
    for (i, device) in devices.iter().enumerate() {
        println!(
            "  [{}] {} ({}Hz, {} ch)",
            i,
            device.name(),
            device.sample_rate(),
            device.channels()
        );
    }

    print!("\nSelect device [0]: ");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input).ok();
    let choice: usize = input.trim().parse().unwrap_or(0);

    let Some(device) = devices.into_iter().nth(choice).or_else(CpalDevice::default_output) else {
        eprintln!("No usable device");
        return Ok(());
    };
    println!("\nUsing: {} @ {}Hz", device.name(), device.sample_rate());

    let config = device.engine_config();
    let mut engine = Engine::new(config)?;
    let osc = engine.add(
        Oscillator::new(Waveform::Sawtooth, 55.0, config.sample_rate).with_amplitude(0.3),
    );
    let mut ladder = engine.add(Filter::ladder(LadderLowPass::new(
        200.0,
        0.6,
        config.sample_rate,
    )?));
    engine.connect(&osc, &ladder)?;
    engine.output(&ladder)?;

    let playback = device.play(engine)?;
    println!("Sweeping 200 Hz -> 6.4 kHz and back...");

    let steps = 200;
    for i in 0..steps * 2 {
        let step = if i < steps { i } else { 2 * steps - i };
        let t = step as f32 / steps as f32;
        let cutoff = 200.0 * 32f32.powf(t);
        ladder.send(FilterMessage::SetFrequency(cutoff)).ok();
        sleep(Duration::from_millis(20));
    }

    playback.stop();
    Ok(())
}
