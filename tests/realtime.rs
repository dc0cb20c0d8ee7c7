use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use klangwerk::dsp::{Sampler, Waveform};
use klangwerk::nodes::{
    Distorter, DistortionMessage, Oscillator, SamplePlayer, SamplerMessage, Voice, VoiceMessage,
};
use klangwerk::{Engine, EngineConfig};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};

const RATE: f32 = 44_100.0;

/// Counts every event it sees.
struct EventCounter {
    events: Arc<AtomicUsize>,
}

impl Subscriber for EventCounter {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, _event: &Event<'_>) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

#[test]
fn rendering_emits_no_log_events() {
    let events = Arc::new(AtomicUsize::new(0));
    let counter = EventCounter {
        events: Arc::clone(&events),
    };

    tracing::subscriber::with_default(counter, || {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let osc = engine.add(Oscillator::new(Waveform::Sine, 220.0, RATE));
        let mut fx = engine.add(Distorter::new(RATE).unwrap().with_preset(1));
        let mut voice = engine.add(Voice::new(RATE).unwrap());
        let mut player = engine.add(SamplePlayer::new(Sampler::new(vec![0.5; 32], RATE)));
        engine.connect(&osc, &fx).unwrap();
        engine.connect(&voice, &fx).unwrap();
        engine.connect(&player, &fx).unwrap();
        engine.output(&fx).unwrap();

        // construction and wiring are logged on the control side
        let after_setup = events.load(Ordering::SeqCst);
        assert!(after_setup > 0);

        fx.send(DistortionMessage::SetPreset(2)).unwrap();
        fx.send(DistortionMessage::SetPreset(9)).unwrap();
        voice.send(VoiceMessage::NoteOn { note: 60, velocity: 100 }).unwrap();
        player.send(SamplerMessage::SetData(vec![0.25; 64])).unwrap();

        let mut block = vec![0.0; 4096];
        for _ in 0..4 {
            engine.render(&mut block);
        }
        assert_eq!(events.load(Ordering::SeqCst), after_setup);
    });
}
