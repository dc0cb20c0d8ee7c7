use criterion::{black_box, criterion_group, criterion_main, Criterion};
use klangwerk::dsp::{
    AnalogFilter, Distortion, LadderLowPass, ShapeKind, SignalProcessor, SignalSource, WaveShaper,
    Waveform, Wavetable,
};
use klangwerk::nodes::{Distorter, Oscillator, Panner};
use klangwerk::{Engine, EngineConfig, BLOCK_SIZE};

const RATE: f32 = 48_000.0;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("Wavetable.out()", |b| {
        let mut osc = Wavetable::new(Waveform::Sawtooth, 512, RATE);
        osc.set_frequency(480.0);
        osc.interpolate_samples(true);
        let mut block = [0.0f32; BLOCK_SIZE];

        b.iter(|| osc.out(black_box(&mut block)))
    });

    c.bench_function("AnalogFilter.process_block()", |b| {
        let mut lpf = AnalogFilter::low_pass(2_000.0, RATE).unwrap();
        let mut block = [0.25f32; BLOCK_SIZE];

        b.iter(|| lpf.process_block(black_box(&mut block)))
    });

    c.bench_function("LadderLowPass.process_block()", |b| {
        let mut ladder = LadderLowPass::new(1_000.0, 0.7, RATE).unwrap();
        let mut block = [0.25f32; BLOCK_SIZE];

        b.iter(|| ladder.process_block(black_box(&mut block)))
    });

    c.bench_function("WaveShaper.apply() all kinds", |b| {
        let mut shaper = WaveShaper::new();
        let source: Vec<f32> = (0..BLOCK_SIZE).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut block = [0.0f32; BLOCK_SIZE];

        b.iter(|| {
            for kind in ShapeKind::ALL {
                block.copy_from_slice(&source);
                shaper.apply(black_box(&mut block), kind, 90);
            }
        })
    });

    c.bench_function("Distortion.out()", |b| {
        let mut fx = Distortion::new(RATE).unwrap();
        fx.set_preset(2);
        let mut left = [0.3f32; BLOCK_SIZE];
        let mut right = [-0.3f32; BLOCK_SIZE];

        b.iter(|| fx.out(black_box(&mut left), black_box(&mut right)))
    });

    c.bench_function("Engine.render() osc -> distortion -> pan", |b| {
        let config = EngineConfig::default().with_sample_rate(RATE);
        let mut engine = Engine::new(config).unwrap();
        let osc = engine.add(Oscillator::new(Waveform::Sine, 220.0, RATE));
        let fx = engine.add(Distorter::new(RATE).unwrap());
        let pan = engine.add(Panner::default());
        engine.connect(&osc, &fx).unwrap();
        engine.connect(&fx, &pan).unwrap();
        engine.output(&pan).unwrap();
        let mut block = vec![0.0f32; config.block_size * config.channels];

        b.iter(|| engine.render(black_box(&mut block)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
