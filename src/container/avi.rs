//! AVI (RIFF) container parsing: `hdrl`/`avih` main header plus per-stream
//! `strl/strh`+`strf` walk for the video track.
//!
//! Grounded on `other_examples/ssoj13-exiftool-rs__crates-exiftool-formats-src-avi.rs`'s
//! RIFF chunk walk shape.

use crate::error::ProbeError;
use crate::types::{ColorInfo, Container, ParsedVideoMetadata, VideoTrackMetadata};

const CONTAINER_NAME: &str = "avi";

struct Chunk<'a> {
    id: [u8; 4],
    payload: &'a [u8],
}

/// Walk sibling RIFF chunks starting at `data`: 4-byte FourCC id, 4-byte
/// little-endian size, then that many payload bytes (padded to an even
/// boundary).
fn walk_chunks(data: &[u8]) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut offset = 0usize;
    while offset + 8 <= data.len() {
        let id = [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]];
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        let payload_start = offset + 8;
        if payload_start + size > data.len() {
            break;
        }
        chunks.push(Chunk {
            id,
            payload: &data[payload_start..payload_start + size],
        });
        offset = payload_start + size + (size % 2); // even-align padding byte
    }
    chunks
}

/// A `LIST` chunk's payload begins with a 4-byte list type before its
/// child chunks.
fn list_children(list_payload: &[u8]) -> Option<(&[u8; 4], Vec<Chunk<'_>>)> {
    if list_payload.len() < 4 {
        return None;
    }
    let list_type: &[u8; 4] = list_payload[0..4].try_into().ok()?;
    Some((list_type, walk_chunks(&list_payload[4..])))
}

fn find_list<'a>(chunks: &'a [Chunk<'a>], list_type: &[u8; 4]) -> Option<Vec<Chunk<'a>>> {
    for c in chunks {
        if &c.id == b"LIST" {
            if let Some((lt, children)) = list_children(c.payload) {
                if lt == list_type {
                    return Some(children);
                }
            }
        }
    }
    None
}

fn find_chunk<'a>(chunks: &'a [Chunk<'a>], id: &[u8; 4]) -> Option<&'a [u8]> {
    chunks.iter().find(|c| &c.id == id).map(|c| c.payload)
}

pub fn parse(data: &[u8]) -> Result<ParsedVideoMetadata, ProbeError> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"AVI " {
        return Err(ProbeError::UnsupportedContainer {
            context: Some("missing RIFF/AVI signature".to_string()),
        });
    }

    let top = walk_chunks(&data[12..]);
    let hdrl = find_list(&top, b"hdrl").ok_or_else(|| ProbeError::TruncatedInput {
        container: CONTAINER_NAME,
        what: "missing LIST/hdrl".to_string(),
        offset: None,
    })?;

    let avih = find_chunk(&hdrl, b"avih").ok_or_else(|| ProbeError::MalformedStructure {
        container: CONTAINER_NAME,
        what: "missing avih MainAVIHeader".to_string(),
        offset: None,
    })?;
    let header = parse_main_header(avih).ok_or_else(|| ProbeError::MalformedStructure {
        container: CONTAINER_NAME,
        what: "avih shorter than MainAVIHeader".to_string(),
        offset: None,
    })?;

    let mut track: Option<VideoTrackMetadata> = None;
    let mut has_audio = false;
    let mut audio_channels = 0u32;
    let mut audio_sample_rate = 0u32;

    for c in &hdrl {
        if &c.id != b"LIST" {
            continue;
        }
        let Some((b"strl", children)) = list_children(c.payload) else {
            continue;
        };
        let Some(strh) = find_chunk(&children, b"strh") else {
            continue;
        };
        if strh.len() < 4 {
            continue;
        }
        let fcc_type: [u8; 4] = strh[0..4].try_into().unwrap();

        if &fcc_type == b"vids" && track.is_none() {
            let handler_fourcc: [u8; 4] = strh.get(4..8).and_then(|b| b.try_into().ok()).unwrap_or_default();
            let mut t = VideoTrackMetadata {
                width: header.width,
                height: header.height,
                display_aspect_width: header.width,
                display_aspect_height: header.height,
                color: ColorInfo::empty(),
                codec: fourcc_to_codec_tag(&handler_fourcc),
                fps: if header.micro_sec_per_frame > 0 {
                    Some(1_000_000.0 / header.micro_sec_per_frame as f64)
                } else {
                    None
                },
                ..Default::default()
            };
            if let Some(info) = find_chunk(&children, b"strf").and_then(parse_bitmap_info_header) {
                if info.width > 0 {
                    t.width = info.width;
                    t.display_aspect_width = info.width;
                }
                if info.height > 0 {
                    t.height = info.height;
                    t.display_aspect_height = info.height;
                }
                t.codec = fourcc_to_codec_tag(&info.compression);
            }
            track = Some(t);
        } else if &fcc_type == b"auds" {
            has_audio = true;
            if let Some(strf) = find_chunk(&children, b"strf") {
                if let Some((ch, rate)) = parse_wave_format(strf) {
                    audio_channels = ch;
                    audio_sample_rate = rate;
                }
            }
        }
    }

    let Some(track) = track else {
        return Err(ProbeError::NoVideoTrack {
            container: CONTAINER_NAME,
        });
    };

    let duration = if let Some(fps) = track.fps {
        if fps > 0.0 {
            header.total_frames as f64 / fps
        } else {
            0.0
        }
    } else {
        0.0
    };

    if audio_channels == 0 {
        audio_channels = if has_audio { 2 } else { 0 };
    }
    if audio_sample_rate == 0 {
        audio_sample_rate = if has_audio { 44_100 } else { 0 };
    }

    Ok(ParsedVideoMetadata {
        container: Container::Avi,
        track,
        has_audio,
        audio_channels,
        audio_sample_rate,
        audio_codec: String::new(),
        duration,
        file_size: data.len() as u64,
        bitrate: None,
        location: None,
    })
}

struct MainAviHeader {
    micro_sec_per_frame: u32,
    total_frames: u32,
    width: u32,
    height: u32,
}

/// `MainAVIHeader`: microSecPerFrame, maxBytesPerSec, paddingGranularity,
/// flags, totalFrames, initialFrames, streams, suggestedBufferSize, width,
/// height, then 16 reserved bytes.
fn parse_main_header(avih: &[u8]) -> Option<MainAviHeader> {
    if avih.len() < 40 {
        return None;
    }
    let u32_at = |off: usize| u32::from_le_bytes(avih[off..off + 4].try_into().unwrap());
    Some(MainAviHeader {
        micro_sec_per_frame: u32_at(0),
        total_frames: u32_at(16),
        width: u32_at(32),
        height: u32_at(36),
    })
}

struct BitmapInfoHeader {
    width: u32,
    height: u32,
    compression: [u8; 4],
}

/// `BITMAPINFOHEADER`: biSize(4), biWidth(4, i32), biHeight(4, i32, often
/// negative for top-down DIBs), biPlanes(2), biBitCount(2),
/// biCompression(4, FourCC or numeric codec id).
fn parse_bitmap_info_header(strf: &[u8]) -> Option<BitmapInfoHeader> {
    if strf.len() < 20 {
        return None;
    }
    let width = i32::from_le_bytes(strf[4..8].try_into().unwrap()).unsigned_abs();
    let height = i32::from_le_bytes(strf[8..12].try_into().unwrap()).unsigned_abs();
    let compression: [u8; 4] = strf[16..20].try_into().unwrap();
    Some(BitmapInfoHeader {
        width,
        height,
        compression,
    })
}

/// `WAVEFORMATEX`: wFormatTag(2), nChannels(2), nSamplesPerSec(4), ...
fn parse_wave_format(strf: &[u8]) -> Option<(u32, u32)> {
    if strf.len() < 8 {
        return None;
    }
    let channels = u16::from_le_bytes(strf[2..4].try_into().unwrap()) as u32;
    let sample_rate = u32::from_le_bytes(strf[4..8].try_into().unwrap());
    Some((channels, sample_rate))
}

fn fourcc_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(4)
        .map(|&b| b as char)
        .collect::<String>()
        .trim_end_matches('\0')
        .to_string()
}

/// Map a `biCompression`/`strh` handler FourCC to a short codec tag,
/// uppercasing-insensitive per the literal AVI codec table.
fn fourcc_to_codec_tag(fourcc: &[u8; 4]) -> String {
    let upper = fourcc_to_string(fourcc).to_uppercase();
    match upper.as_str() {
        "DIV3" => "divx3",
        "DIVX" => "divx",
        "DX50" => "divx5",
        "XVID" => "xvid",
        "MP42" => "mp42",
        "MP43" => "mp43",
        "H264" | "X264" | "DAVC" => "avc1",
        "HEVC" => "hev1",
        "MPG1" => "mpeg1",
        "MPG2" => "mpeg2",
        _ => return upper.to_lowercase(),
    }
    .to_string()
}
