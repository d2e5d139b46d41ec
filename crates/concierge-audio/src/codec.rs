// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PCM16 little-endian wire codec with base64 framing.
//!
//! Outbound microphone frames are 16 kHz mono PCM16; inbound agent speech
//! is 24 kHz mono PCM16. All functions are pure.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use concierge_core::ConciergeError;
use concierge_core::types::MediaBlob;

use crate::buffer::AudioBuffer;

/// Rate of the audio sent to the remote model.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Rate of the audio the remote model sends back.
pub const PLAYBACK_SOURCE_RATE: u32 = 24_000;

/// Media type tag attached to every outbound frame.
pub const CAPTURE_MIME_TYPE: &str = "audio/pcm;rate=16000";

const PCM16_SCALE: f32 = 32767.0;

/// Converts samples in `[-1, 1]` to PCM16 little-endian bytes.
///
/// Out-of-range samples are clamped; NaN encodes as silence.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * PCM16_SCALE) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Encodes a captured frame into the tagged base64 payload the live session expects.
pub fn encode_for_transport(samples: &[f32]) -> MediaBlob {
    MediaBlob {
        mime_type: CAPTURE_MIME_TYPE.to_string(),
        data: B64.encode(encode_pcm16(samples)),
    }
}

/// Interprets PCM16 little-endian bytes as normalized samples.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, ConciergeError> {
    if bytes.len() % 2 != 0 {
        return Err(ConciergeError::MalformedAudioFrame(format!(
            "PCM16 payload has odd byte length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / PCM16_SCALE)
        .collect())
}

/// Decodes a base64 PCM16 chunk from the remote model into a playable buffer.
///
/// The payload is 24 kHz mono; the result is resampled to `target_rate`
/// when the playback context runs at a different rate.
pub fn decode_incoming_audio(payload: &str, target_rate: u32) -> Result<AudioBuffer, ConciergeError> {
    let bytes = B64
        .decode(payload.trim())
        .map_err(|e| ConciergeError::MalformedAudioFrame(format!("invalid base64: {e}")))?;
    let samples = decode_pcm16(&bytes)?;
    Ok(AudioBuffer::new(samples, PLAYBACK_SOURCE_RATE).resampled(target_rate))
}

/// Rejects an inbound media type that declares a rate other than 24 kHz.
///
/// A missing `rate=` parameter, or a non-PCM type, is accepted as 24 kHz.
pub fn check_incoming_mime(mime_type: &str) -> Result<(), ConciergeError> {
    match pcm_rate_from_mime(mime_type) {
        Some(rate) if rate != PLAYBACK_SOURCE_RATE => Err(ConciergeError::MalformedAudioFrame(
            format!("unexpected inbound sample rate {rate} in {mime_type:?}"),
        )),
        _ => Ok(()),
    }
}

/// Extracts the `rate=` parameter of a PCM media type, e.g. `audio/pcm;rate=24000`.
pub fn pcm_rate_from_mime(mime_type: &str) -> Option<u32> {
    let mut parts = mime_type.split(';');
    let essence = parts.next()?.trim();
    if !essence.eq_ignore_ascii_case("audio/pcm") {
        return None;
    }
    parts
        .filter_map(|p| p.trim().strip_prefix("rate="))
        .find_map(|r| r.trim().parse().ok())
}
