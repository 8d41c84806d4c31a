// SYNOID Reel Clip Duration
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Narration length decides how long each picture stays on screen, so it is
// read from the audio file itself rather than estimated from the text.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::CodecParameters;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

/// Duration of an audio file in seconds.
pub fn audio_duration(path: &Path) -> Result<f64> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    if is_wav {
        wav_duration(path)
    } else {
        decoded_duration(path)
    }
}

/// Exact length from the WAV header.
pub fn wav_duration(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path).with_context(|| format!("Open WAV {:?}", path))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(anyhow!("WAV {:?} reports a zero sample rate", path));
    }
    Ok(reader.duration() as f64 / spec.sample_rate as f64)
}

/// Length of any container symphonia can demux. Uses the frame count when the
/// header has one, otherwise walks the packets.
pub fn decoded_duration(path: &Path) -> Result<f64> {
    let (format, track_id, params) = open_default_track(path)?;

    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if frames > 0 && rate > 0 {
            return Ok(frames as f64 / rate as f64);
        }
    }

    walk_packets(format, track_id, &params, path)
}

/// Length from the packet timestamps alone, ignoring any header frame count.
/// Streams without a Xing/Info header (typical `edge-tts` MP3) end up here.
pub fn streamed_duration(path: &Path) -> Result<f64> {
    let (format, track_id, params) = open_default_track(path)?;
    walk_packets(format, track_id, &params, path)
}

fn open_default_track(path: &Path) -> Result<(Box<dyn FormatReader>, u32, CodecParameters)> {
    let file = File::open(path).with_context(|| format!("Open audio {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Unrecognised audio format {:?}", path))?;
    let format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("No audio track in {:?}", path))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    Ok((format, track_id, params))
}

fn walk_packets(
    mut format: Box<dyn FormatReader>,
    track_id: u32,
    params: &CodecParameters,
    path: &Path,
) -> Result<f64> {
    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or_else(|| anyhow!("No time base for {:?}", path))?;

    let mut end_ts: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    end_ts = end_ts.max(packet.ts() + packet.dur());
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(e).with_context(|| format!("Reading packets from {:?}", path)),
        }
    }

    let time = time_base.calc_time(end_ts);
    Ok(time.seconds as f64 + time.frac)
}
