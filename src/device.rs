//! CPAL device discovery and playback.
//!
//! [`CpalDevice`] finds an output device; [`CpalDevice::play`] moves an
//! [`Engine`] onto that device's audio callback.
//!
//! # Example: List Devices and Play
//!
//! ```no_run
//! use klangwerk::{CpalDevice, Engine};
//!
//! for (i, device) in CpalDevice::list_outputs().iter().enumerate() {
//!     println!("[{}] {} ({} Hz, {} ch)",
//!         i, device.name(), device.sample_rate(), device.channels());
//! }
//!
//! let device = CpalDevice::default_output().unwrap();
//! let engine = Engine::new(device.engine_config()).unwrap();
//! let playback = device.play(engine).unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! playback.stop();
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};

use crate::config::{EngineConfig, MAX_OUTPUT_CHANNELS};
use crate::engine::Engine;
use crate::error::Error;

/// A discovered audio output device.
pub struct CpalDevice {
    device: cpal::Device,
    sample_format: SampleFormat,
    name: String,
    sample_rate: u32,
    channels: u16,
}

impl CpalDevice {
    /// Get the system's default output device.
    ///
    /// Returns `None` if no audio device is available.
    pub fn default_output() -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;
        Self::from_device(device)
    }

    /// List all available audio output devices.
    ///
    /// Returns an empty list if no devices are found or if enumeration fails.
    pub fn list_outputs() -> Vec<Self> {
        let host = cpal::default_host();
        host.output_devices()
            .map(|devices| devices.filter_map(Self::from_device).collect())
            .unwrap_or_default()
    }

    fn from_device(device: cpal::Device) -> Option<Self> {
        let config = device.default_output_config().ok()?;
        let name = device.name().unwrap_or_else(|_| "Unknown".into());
        Some(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            sample_format: config.sample_format(),
            name,
            device,
        })
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of output channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// An engine configuration matching this device.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_sample_rate(self.sample_rate as f32)
            .with_channels((self.channels as usize).clamp(1, MAX_OUTPUT_CHANNELS))
    }

    /// Start a stream that renders `engine` from the device callback.
    ///
    /// The stream is opened with the engine's sample rate and channel count.
    /// It lives on its own thread until the returned [`Playback`] is stopped
    /// or dropped. Keep the engine's [`Handle`](crate::Handle)s to control it.
    pub fn play(&self, engine: Engine) -> Result<Playback, Error> {
        let stream_config = StreamConfig {
            channels: engine.channels() as u16,
            sample_rate: cpal::SampleRate(engine.sample_rate() as u32),
            buffer_size: cpal::BufferSize::Default,
        };
        let scratch_len = engine.config().block_size * engine.channels();
        let device = self.device.clone();
        let sample_format = self.sample_format;
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        tracing::info!(device = %self.name, ?sample_format, "starting playback");

        // Streams are not Send on every backend, so build and hold it on one thread
        let thread = std::thread::spawn(move || {
            let stream =
                match build_stream(&device, sample_format, &stream_config, engine, scratch_len) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(Error::Device(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while !stop_flag.load(Ordering::Acquire) {
                std::thread::park_timeout(Duration::from_millis(100));
            }
            drop(stream);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Playback {
                stop,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(Error::Device("playback thread exited".to_string())),
        }
    }
}

/// A running output stream. Stops when dropped.
pub struct Playback {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Playback {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            let _ = thread.join();
            tracing::info!("playback stopped");
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_stream(
    device: &cpal::Device,
    sample_format: SampleFormat,
    config: &StreamConfig,
    mut engine: Engine,
    scratch_len: usize,
) -> Result<cpal::Stream, Error> {
    let on_error = |err: cpal::StreamError| tracing::error!(%err, "stream error");
    let mut scratch = alloc::vec![0.0f32; scratch_len];

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            config,
            move |data: &mut [f32], _| engine.render(data),
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            config,
            move |data: &mut [i16], _| {
                render_converted(&mut engine, &mut scratch, data, |s| {
                    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                })
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_output_stream(
            config,
            move |data: &mut [u16], _| {
                render_converted(&mut engine, &mut scratch, data, |s| {
                    ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16
                })
            },
            on_error,
            None,
        ),
        other => return Err(Error::Device(alloc::format!("unsupported sample format {other:?}"))),
    };
    stream.map_err(|e| Error::Device(e.to_string()))
}

fn render_converted<T>(
    engine: &mut Engine,
    scratch: &mut Vec<f32>,
    data: &mut [T],
    convert: impl Fn(f32) -> T,
) {
    // Only grows when the host hands us a larger buffer than expected
    if scratch.len() < data.len() {
        scratch.resize(data.len(), 0.0);
    }
    let scratch = &mut scratch[..data.len()];
    engine.render(scratch);
    for (out, &s) in data.iter_mut().zip(scratch.iter()) {
        *out = convert(s);
    }
}
