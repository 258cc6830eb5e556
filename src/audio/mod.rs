use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio_api::{AudioCommand, StepNotice};

mod bus;
mod engine;
mod frame;
mod fx;
mod voice;

pub use frame::StereoFrame;

use engine::Engine;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    notice_rx: Receiver<StepNotice>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    pub fn poll_step_notice(&self) -> Option<StepNotice> {
        self.notice_rx.try_recv().ok()
    }

    /// Current audio time in seconds, derived from the rendered frame count.
    /// This is the clock every scheduled event time is expressed in.
    pub fn clock_secs(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let (notice_tx, notice_rx) = crossbeam_channel::bounded::<StepNotice>(256);

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let config = device
        .default_output_config()
        .context("no default output config")?;

    let sample_rate = config.sample_rate() as f32;
    let channels = config.channels() as usize;
    anyhow::ensure!(channels == 2, "only stereo output is supported");
    let clock = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(
                &device,
                &config.into(),
                rx,
                notice_tx,
                clock.clone(),
                sample_rate,
                channels,
            )?;
            output_stream
                .play()
                .context("failed to play output stream")?;

            Ok(AudioHandle {
                tx,
                notice_rx,
                clock,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        _ => anyhow::bail!("unsupported sample format (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    notice_tx: Sender<StepNotice>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate, clock);
    engine.set_notice_tx(notice_tx);

    let err_fn = |err| eprintln!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            // drain control commands before rendering; this is also what
            // makes CancelPending atomic w.r.t. pending-event firing
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels;
            let frames: &mut [StereoFrame] = unsafe {
                // stereo interleaved f32 output, same layout as StereoFrame
                std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut StereoFrame, n_frames)
            };
            engine.render_block(frames);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
