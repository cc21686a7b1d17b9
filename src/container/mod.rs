//! Container format detection and parsing: sniffs the input, delegates to
//! the matching parser, and assembles the unified public result.
//!
//! Grounded on `sceneforged-probe/src/container/mod.rs::detect_container`'s
//! magic-byte sniffing shape, extended to the full signature table.

pub mod avi;
pub mod mkv;
pub mod mov;
pub mod mp4;
pub mod ts;

use crate::error::ProbeError;
use crate::types::{
    Container, NaturalOrientation, Orientation, ParsedVideoMetadata, VideoInfoResult,
};

const SNIFF_WINDOW: usize = 32;

/// Sniff the first ~32 bytes to identify the container, per the input
/// recognition table. WebM and MKV share the EBML magic, so DocType
/// discrimination (delegated to [`mkv::parse`]) happens after this sniff
/// only selects "some flavor of EBML".
fn sniff_container(data: &[u8]) -> Container {
    if data.len() >= 3 * 188 && data[0] == 0x47 && data[188] == 0x47 && data[376] == 0x47 {
        return Container::Ts;
    }
    if data.len() >= 4 && &data[0..4] == b"RIFF" {
        return Container::Avi;
    }
    if data.len() >= 4 && &data[0..4] == [0x1A, 0x45, 0xDF, 0xA3] {
        return Container::Mkv; // refined to WebM/Mkv by DocType inside mkv::parse
    }

    let window = &data[..data.len().min(SNIFF_WINDOW)];
    if find_marker(window, b"ftyp") {
        return Container::Mp4;
    }
    if find_marker(window, b"moov") {
        return Container::Mov;
    }

    Container::Unknown
}

fn find_marker(window: &[u8], marker: &[u8; 4]) -> bool {
    window.windows(4).any(|w| w == marker)
}

/// Parse a whole byte buffer into the public result record.
pub fn parse_video_metadata(data: &[u8]) -> Result<VideoInfoResult, ProbeError> {
    let container = sniff_container(data);
    let parsed = match container {
        Container::Ts => ts::parse(data)?,
        Container::Avi => avi::parse(data)?,
        Container::Mkv => mkv::parse(data)?, // DocType inside may re-tag as WebM
        Container::Mp4 => mp4::parse(data, Container::Mp4)?,
        Container::Mov => mov::parse(data)?,
        Container::WebM | Container::Unknown => {
            return Err(ProbeError::UnsupportedContainer {
                context: Some("no known container signature in first 32 bytes".to_string()),
            })
        }
    };
    Ok(assemble_result(parsed))
}

fn assemble_result(parsed: ParsedVideoMetadata) -> VideoInfoResult {
    let track = &parsed.track;
    let width = track.width;
    let height = track.height;

    let natural_orientation = if height > width {
        NaturalOrientation::Portrait
    } else {
        NaturalOrientation::Landscape
    };
    let orientation = orientation_from(track.rotation, natural_orientation);

    let aspect_ratio = if width > 0 && height > 0 {
        Some(width as f64 / height as f64)
    } else {
        None
    };
    let is_16_9 = aspect_ratio
        .map(|ar| (ar - 16.0 / 9.0).abs() < 0.01)
        .unwrap_or(false);

    let bit_rate = track
        .video_bitrate
        .or(parsed.bitrate)
        .unwrap_or_else(|| {
            if parsed.duration > 0.0 && parsed.file_size > 0 {
                ((parsed.file_size as f64 * 8.0) / parsed.duration).round() as u64
            } else {
                0
            }
        });

    let is_hdr = if track.color.is_empty() {
        None
    } else {
        Some(crate::types::is_hdr(&track.color))
    };

    VideoInfoResult {
        duration: parsed.duration,
        has_audio: parsed.has_audio,
        is_hdr,
        width,
        height,
        fps: track.fps,
        bit_rate,
        file_size: parsed.file_size,
        codec: track.codec.clone(),
        orientation,
        natural_orientation,
        aspect_ratio,
        is_16_9,
        audio_sample_rate: parsed.audio_sample_rate,
        audio_channels: parsed.audio_channels,
        audio_codec: parsed.audio_codec,
        location: parsed.location,
    }
}

/// Rotation/natural-orientation → orientation mapping, per spec §4.8.
fn orientation_from(rotation: u16, natural: NaturalOrientation) -> Orientation {
    match (rotation, natural) {
        (0, NaturalOrientation::Landscape) => Orientation::LandscapeRight,
        (0, NaturalOrientation::Portrait) => Orientation::Portrait,
        (90, _) => Orientation::Portrait,
        (180, NaturalOrientation::Landscape) => Orientation::LandscapeLeft,
        (180, NaturalOrientation::Portrait) => Orientation::PortraitUpsideDown,
        (270, _) => Orientation::PortraitUpsideDown,
        _ => Orientation::LandscapeRight,
    }
}
