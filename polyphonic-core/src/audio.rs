//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It re-chunks whatever block size the device delivers into fixed-size capture
//! chunks and streams them to the analysis thread.
//!
//! ## Features
//! - Automatic selection of the default input device
//! - Any sample format, converted to `f32`; multi-channel input downmixed to mono
//! - Non-blocking hand-off: chunks are dropped rather than stalling the audio callback

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{Sender, TrySendError};
use log::{info, warn};

/// The default input device together with the configuration its stream is built with.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    format: SampleFormat,
}

impl AudioInput {
    /// Selects the default audio input device and its default configuration.
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        info!("Using audio input device: {}", device.name()?);

        let supported = device.default_input_config()?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();

        info!(
            "Input config: {} Hz, {} channel(s), {:?}",
            config.sample_rate.0, config.channels, format
        );

        Ok(Self {
            device,
            config,
            format,
        })
    }

    /// Sample rate the stream will run at.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Starts capturing.
    ///
    /// This function:
    /// 1. Builds an input stream converting every sample to mono `f32`
    /// 2. Sends every complete chunk of `capture_size` samples on `sender`
    ///
    /// # Arguments
    /// * `sender` - Channel sender feeding the analysis thread
    /// * `capture_size` - Number of samples per chunk
    ///
    /// # Returns
    /// * `Ok(stream)` - Running stream handle; capture stops when it is dropped
    /// * `Err(e)` - Unsupported sample format, or the stream could not be built
    pub fn start(&self, sender: Sender<Vec<f32>>, capture_size: usize) -> Result<Stream> {
        let (device, config) = (&self.device, &self.config);
        let stream = match self.format {
            SampleFormat::I8 => build_stream::<i8>(device, config, sender, capture_size)?,
            SampleFormat::I16 => build_stream::<i16>(device, config, sender, capture_size)?,
            SampleFormat::I32 => build_stream::<i32>(device, config, sender, capture_size)?,
            SampleFormat::U8 => build_stream::<u8>(device, config, sender, capture_size)?,
            SampleFormat::U16 => build_stream::<u16>(device, config, sender, capture_size)?,
            SampleFormat::U32 => build_stream::<u32>(device, config, sender, capture_size)?,
            SampleFormat::F32 => build_stream::<f32>(device, config, sender, capture_size)?,
            SampleFormat::F64 => build_stream::<f64>(device, config, sender, capture_size)?,
            other => return Err(anyhow!("Unsupported sample format {:?}", other)),
        };

        stream.play()?;

        Ok(stream)
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    sender: Sender<Vec<f32>>,
    capture_size: usize,
) -> Result<Stream>
where
    T: Sample + SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let mut chunker = Chunker::new(capture_size);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mono = data.chunks(channels).map(|frame| {
                frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>() / channels as f32
            });
            chunker.extend(mono, |chunk| match sender.try_send(chunk) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => warn!("Analysis queue full, dropping capture chunk"),
                Err(TrySendError::Disconnected(_)) => {}
            });
        },
        |err| warn!("An error occurred on the audio stream: {}", err),
        None,
    )?;

    Ok(stream)
}

/// Collects samples into fixed-size chunks across callback boundaries.
#[derive(Debug)]
pub struct Chunker {
    capture_size: usize,
    pending: Vec<f32>,
}

impl Chunker {
    pub fn new(capture_size: usize) -> Self {
        Self {
            capture_size,
            pending: Vec::with_capacity(capture_size),
        }
    }

    /// Appends samples, calling `emit` for every chunk that becomes complete.
    pub fn extend<I, F>(&mut self, samples: I, mut emit: F)
    where
        I: IntoIterator<Item = f32>,
        F: FnMut(Vec<f32>),
    {
        for sample in samples {
            self.pending.push(sample);
            if self.pending.len() == self.capture_size {
                let chunk = std::mem::replace(
                    &mut self.pending,
                    Vec::with_capacity(self.capture_size),
                );
                emit(chunk);
            }
        }
    }

    /// Samples waiting for the next chunk to complete.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
