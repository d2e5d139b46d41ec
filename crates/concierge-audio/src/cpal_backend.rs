// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host microphone and speaker access through `cpal`.
//!
//! `cpal::Stream` is not `Send` on every platform, so each stream lives on
//! a dedicated thread that parks until the owning handle asks it to stop.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use concierge_core::{AdapterType, ConciergeError, HealthStatus, PluginAdapter};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::buffer::{downmix, resample_linear};
use crate::device::{AudioSink, AudioSource, CaptureStream, PlaybackSink};
use crate::mixer::{Mixer, MixerSink};

fn adapter_version() -> semver::Version {
    semver::Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| semver::Version::new(0, 1, 0))
}

fn device_error(message: impl Into<String>, err: impl std::error::Error + Send + Sync + 'static) -> ConciergeError {
    ConciergeError::DeviceUnavailable {
        message: message.into(),
        source: Some(Box::new(err)),
    }
}

fn map_build_error(err: cpal::BuildStreamError) -> ConciergeError {
    match &err {
        cpal::BuildStreamError::BackendSpecific { err: backend }
            if backend.description.to_ascii_lowercase().contains("permission") =>
        {
            ConciergeError::PermissionDenied(backend.description.clone())
        }
        _ => device_error("failed to open audio stream", err),
    }
}

fn find_input_device(name: Option<&str>) -> Result<cpal::Device, ConciergeError> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| device_error("failed to enumerate input devices", e))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| ConciergeError::DeviceUnavailable {
                message: format!("input device not found: {wanted}"),
                source: None,
            }),
        None => host
            .default_input_device()
            .ok_or_else(|| ConciergeError::DeviceUnavailable {
                message: "no default input device".into(),
                source: None,
            }),
    }
}

fn find_output_device(name: Option<&str>) -> Result<cpal::Device, ConciergeError> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .output_devices()
            .map_err(|e| device_error("failed to enumerate output devices", e))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| ConciergeError::DeviceUnavailable {
                message: format!("output device not found: {wanted}"),
                source: None,
            }),
        None => host
            .default_output_device()
            .ok_or_else(|| ConciergeError::DeviceUnavailable {
                message: "no default output device".into(),
                source: None,
            }),
    }
}

/// Runs `build` on a dedicated thread that keeps the stream alive until
/// the returned sender is used or dropped.
fn spawn_stream_thread<T, F>(
    thread_name: &str,
    build: F,
) -> Result<(T, std_mpsc::Sender<()>), ConciergeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<(cpal::Stream, T), ConciergeError> + Send + 'static,
{
    let (ready_tx, ready_rx) = std_mpsc::channel();
    let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

    std::thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || match build() {
            Ok((stream, value)) => {
                let _ = ready_tx.send(Ok(value));
                // Returns on an explicit stop or when the handle is dropped.
                let _ = stop_rx.recv();
                drop(stream);
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
            }
        })
        .map_err(|e| device_error("failed to spawn audio thread", e))?;

    let value = ready_rx.recv().map_err(|_| ConciergeError::DeviceUnavailable {
        message: "audio thread exited before the stream started".into(),
        source: None,
    })??;
    Ok((value, stop_tx))
}

/// Default (or named) host microphone.
#[derive(Debug, Clone, Default)]
pub struct CpalAudioSource {
    device_name: Option<String>,
}

impl CpalAudioSource {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait]
impl PluginAdapter for CpalAudioSource {
    fn name(&self) -> &str {
        "cpal-input"
    }

    fn version(&self) -> semver::Version {
        adapter_version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AudioSource
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(match find_input_device(self.device_name.as_deref()) {
            Ok(device) => match device.default_input_config() {
                Ok(_) => HealthStatus::Healthy,
                Err(e) => HealthStatus::Degraded(format!("no usable input config: {e}")),
            },
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

impl AudioSource for CpalAudioSource {
    fn open_capture(
        &self,
        sample_rate: u32,
        frame_size: usize,
    ) -> Result<CaptureStream, ConciergeError> {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Vec<f32>>();
        let device_name = self.device_name.clone();
        let frame_size = frame_size.max(1);

        let ((), stop_tx) = spawn_stream_thread("concierge-capture", move || {
            let device = find_input_device(device_name.as_deref())?;
            let supported = device
                .default_input_config()
                .map_err(|e| device_error("failed to query input config", e))?;
            let native_rate = supported.sample_rate().0;
            let channels = usize::from(supported.channels());
            let config = cpal::StreamConfig {
                channels: supported.channels(),
                sample_rate: cpal::SampleRate(native_rate),
                buffer_size: cpal::BufferSize::Default,
            };
            info!(
                device = %device.name().unwrap_or_else(|_| "unknown".into()),
                native_rate,
                channels,
                "opening microphone"
            );

            // Shared so the error callback can close the frame channel.
            let tx = Arc::new(Mutex::new(Some(frame_tx)));
            let err_tx = tx.clone();
            let mut pending: Vec<f32> = Vec::with_capacity(frame_size * 2);

            let stream = device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let mono = downmix(data, channels);
                        pending.extend(resample_linear(&mono, native_rate, sample_rate));
                        let guard = tx.lock().unwrap_or_else(|e| e.into_inner());
                        let Some(sender) = guard.as_ref() else {
                            return;
                        };
                        while pending.len() >= frame_size {
                            let frame: Vec<f32> = pending.drain(..frame_size).collect();
                            let _ = sender.send(frame);
                        }
                    },
                    move |err| {
                        error!(error = %err, "microphone stream failed");
                        err_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
                    },
                    None,
                )
                .map_err(map_build_error)?;
            stream
                .play()
                .map_err(|e| device_error("failed to start microphone", e))?;
            Ok((stream, ()))
        })?;

        Ok(CaptureStream::new(frame_rx, move || {
            let _ = stop_tx.send(());
        }))
    }
}

/// Default (or named) host speaker.
#[derive(Debug, Clone, Default)]
pub struct CpalAudioSink {
    device_name: Option<String>,
}

impl CpalAudioSink {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait]
impl PluginAdapter for CpalAudioSink {
    fn name(&self) -> &str {
        "cpal-output"
    }

    fn version(&self) -> semver::Version {
        adapter_version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AudioSink
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(match find_output_device(self.device_name.as_deref()) {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

impl AudioSink for CpalAudioSink {
    fn open_playback(&self, sample_rate: u32) -> Result<Box<dyn PlaybackSink>, ConciergeError> {
        let device_name = self.device_name.clone();

        let (mixer, stop_tx) = spawn_stream_thread("concierge-playback", move || {
            let device = find_output_device(device_name.as_deref())?;
            let supported = device
                .default_output_config()
                .map_err(|e| device_error("failed to query output config", e))?;
            let channels = usize::from(supported.channels());

            // Prefer the requested rate; fall back to the device default and
            // let the mixer resample.
            let rate = device
                .supported_output_configs()
                .ok()
                .and_then(|mut configs| {
                    configs.find(|c| {
                        c.channels() == supported.channels()
                            && c.min_sample_rate().0 <= sample_rate
                            && c.max_sample_rate().0 >= sample_rate
                    })
                })
                .map(|_| sample_rate)
                .unwrap_or(supported.sample_rate().0);

            let config = cpal::StreamConfig {
                channels: supported.channels(),
                sample_rate: cpal::SampleRate(rate),
                buffer_size: cpal::BufferSize::Default,
            };
            info!(rate, channels, "opening speaker");

            let mixer = Arc::new(Mutex::new(Mixer::new(rate)));
            let render_mixer = mixer.clone();
            let stream = device
                .build_output_stream(
                    &config,
                    move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        render_mixer
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .render(out, channels);
                    },
                    move |err| error!(error = %err, "speaker stream failed"),
                    None,
                )
                .map_err(map_build_error)?;
            stream
                .play()
                .map_err(|e| device_error("failed to start speaker", e))?;
            Ok((stream, mixer))
        })?;

        Ok(Box::new(MixerSink::new(mixer, move || {
            let _ = stop_tx.send(());
        })))
    }
}
