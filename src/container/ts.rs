//! MPEG Transport Stream container parsing: PSI (PAT/PMT) demux, PCR-based
//! duration estimate, and Annex-B SPS recovery for pixel dimensions.
//!
//! Grounded on `other_examples` PAT/PMT walkers
//! (`xxxxuanran-rust-srec/crates/ts/src/pmt.rs`, `Nachompiras-mpegts_inspector`);
//! SPS recovery reuses [`crate::codec::avc`]/[`crate::codec::hevc`] rather than
//! a placeholder dimension, per this crate's documented resolution of the
//! upstream "source sets a placeholder" open item.

use crate::codec::{avc, hevc};
use crate::error::ProbeError;
use crate::types::{ColorInfo, Container, ParsedVideoMetadata, VideoTrackMetadata};

const PACKET_SIZE: usize = 188;
const SYNC_BYTE: u8 = 0x47;
const PCR_CLOCK_HZ: f64 = 90_000.0;
const FALLBACK_BITS_PER_SEC: f64 = 10_000_000.0;
/// Sanity bound on how much of a selected elementary stream is scanned
/// looking for an SPS NAL, so a pathological file can't force scanning the
/// whole thing.
const MAX_ES_SCAN_BYTES: usize = 4 * 1024 * 1024;

struct PacketHeader {
    pid: u16,
    payload_unit_start: bool,
    has_adaptation: bool,
    has_payload: bool,
    adaptation_field_length: usize,
    pcr: Option<u64>,
}

fn parse_packet_header(packet: &[u8]) -> Option<PacketHeader> {
    if packet.len() < 4 || packet[0] != SYNC_BYTE {
        return None;
    }
    let pid = (((packet[1] & 0x1F) as u16) << 8) | packet[2] as u16;
    let payload_unit_start = packet[1] & 0x40 != 0;
    let afc = (packet[3] >> 4) & 0x03;
    let has_adaptation = afc == 0b10 || afc == 0b11;
    let has_payload = afc == 0b01 || afc == 0b11;

    let mut adaptation_field_length = 0;
    let mut pcr = None;
    if has_adaptation && packet.len() > 4 {
        adaptation_field_length = packet[4] as usize;
        if adaptation_field_length > 0 && packet.len() > 5 {
            let flags = packet[5];
            if flags & 0x10 != 0 && packet.len() >= 12 {
                let b = &packet[6..12];
                let base = ((b[0] as u64) << 25)
                    | ((b[1] as u64) << 17)
                    | ((b[2] as u64) << 9)
                    | ((b[3] as u64) << 1)
                    | ((b[4] as u64) >> 7);
                pcr = Some(base);
            }
        }
    }

    Some(PacketHeader {
        pid,
        payload_unit_start,
        has_adaptation,
        has_payload,
        adaptation_field_length,
        pcr,
    })
}

fn payload_offset(header: &PacketHeader) -> usize {
    let mut offset = 4;
    if header.has_adaptation {
        offset += 1 + header.adaptation_field_length;
    }
    offset
}

fn validate_sync(data: &[u8]) -> Result<(), ProbeError> {
    if data.len() < PACKET_SIZE || data[0] != SYNC_BYTE {
        return Err(ProbeError::UnsupportedContainer {
            context: Some("missing transport stream sync byte".to_string()),
        });
    }
    for &offset in &[0usize, PACKET_SIZE, PACKET_SIZE * 2] {
        if offset < data.len() && data[offset] != SYNC_BYTE {
            return Err(ProbeError::UnsupportedContainer {
                context: Some(format!("sync byte mismatch at offset {offset}")),
            });
        }
    }
    Ok(())
}

pub fn parse(data: &[u8]) -> Result<ParsedVideoMetadata, ProbeError> {
    validate_sync(data)?;

    let mut pat_section = Vec::new();
    for packet in whole_packets(data) {
        let Some(header) = parse_packet_header(packet) else { continue };
        if header.pid == 0 && header.has_payload && header.payload_unit_start {
            let off = payload_offset(&header);
            if off < packet.len() {
                load_psi_section(&mut pat_section, &packet[off..]);
            }
        }
    }
    let Some(pmt_pid) = parse_pat(&pat_section) else {
        return Err(ProbeError::MalformedStructure {
            container: "ts",
            what: "no PMT PID found in PAT".to_string(),
            offset: None,
        });
    };

    let mut pmt_section = Vec::new();
    for packet in whole_packets(data) {
        let Some(header) = parse_packet_header(packet) else { continue };
        if header.pid == pmt_pid && header.has_payload && header.payload_unit_start {
            let off = payload_offset(&header);
            if off < packet.len() {
                load_psi_section(&mut pmt_section, &packet[off..]);
            }
        }
    }
    let (video, audio) = parse_pmt(&pmt_section);
    let (video_pid, video_codec) = video.ok_or(ProbeError::NoVideoTrack { container: "ts" })?;

    let mut first_pcr: Option<u64> = None;
    let mut last_pcr: Option<u64> = None;
    for packet in whole_packets(data) {
        let Some(header) = parse_packet_header(packet) else { continue };
        if let Some(pcr) = header.pcr {
            first_pcr.get_or_insert(pcr);
            last_pcr = Some(pcr);
        }
    }
    let duration_secs = match (first_pcr, last_pcr) {
        (Some(first), Some(last)) if last > first => (last - first) as f64 / PCR_CLOCK_HZ,
        _ => (data.len() as f64 * 8.0) / FALLBACK_BITS_PER_SEC,
    };

    let mut es = Vec::new();
    for packet in whole_packets(data) {
        let Some(header) = parse_packet_header(packet) else { continue };
        if header.pid != video_pid || !header.has_payload {
            continue;
        }
        let off = payload_offset(&header);
        if off >= packet.len() {
            continue;
        }
        let payload = &packet[off..];
        if header.payload_unit_start {
            if let Some(es_bytes) = skip_pes_header(payload) {
                es.extend_from_slice(es_bytes);
            }
        } else {
            es.extend_from_slice(payload);
        }
        if es.len() > MAX_ES_SCAN_BYTES {
            break;
        }
    }

    let (width, height) = sps_dimensions(&video_codec, &es);

    let track = VideoTrackMetadata {
        width,
        height,
        display_aspect_width: width,
        display_aspect_height: height,
        codec: video_codec,
        color: ColorInfo::empty(),
        ..Default::default()
    };

    let has_audio = audio.is_some();

    Ok(ParsedVideoMetadata {
        container: Container::Ts,
        track,
        has_audio,
        audio_channels: if has_audio { 2 } else { 0 },
        audio_sample_rate: if has_audio { 48_000 } else { 0 },
        audio_codec: audio.map(|(_, codec)| codec).unwrap_or_default(),
        duration: duration_secs,
        file_size: data.len() as u64,
        bitrate: None,
        location: None,
    })
}

fn whole_packets(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.chunks(PACKET_SIZE).filter(|c| c.len() == PACKET_SIZE)
}

/// Single-packet PSI section capture: strips the `pointer_field` carried by
/// a payload-unit-start packet. Sections spanning multiple TS packets are
/// not reassembled; PAT/PMT sections are small enough in practice to fit
/// in one packet.
fn load_psi_section(buf: &mut Vec<u8>, payload: &[u8]) {
    if payload.is_empty() {
        return;
    }
    let pointer = payload[0] as usize;
    let start = 1 + pointer;
    if start <= payload.len() {
        buf.clear();
        buf.extend_from_slice(&payload[start..]);
    }
}

fn parse_pat(section: &[u8]) -> Option<u16> {
    if section.len() < 8 || section[0] != 0x00 {
        return None;
    }
    let section_length = (((section[1] & 0x0F) as usize) << 8) | section[2] as usize;
    let end = 3 + section_length;
    if end > section.len() || end < 12 {
        return None;
    }
    let programs_end = end - 4; // exclude trailing CRC32
    let mut pos = 8;
    while pos + 4 <= programs_end {
        let program_number = u16::from_be_bytes([section[pos], section[pos + 1]]);
        let pid = (((section[pos + 2] & 0x1F) as u16) << 8) | section[pos + 3] as u16;
        if program_number != 0 {
            return Some(pid);
        }
        pos += 4;
    }
    None
}

fn parse_pmt(section: &[u8]) -> (Option<(u16, String)>, Option<(u16, String)>) {
    if section.len() < 12 || section[0] != 0x02 {
        return (None, None);
    }
    let section_length = (((section[1] & 0x0F) as usize) << 8) | section[2] as usize;
    let end = 3 + section_length;
    if end > section.len() || end < 4 {
        return (None, None);
    }
    let programs_end = end - 4;
    let program_info_length = (((section[10] & 0x0F) as usize) << 8) | section[11] as usize;

    let mut video = None;
    let mut audio = None;
    let mut pos = 12 + program_info_length;
    while pos + 5 <= programs_end {
        let stream_type = section[pos];
        let pid = (((section[pos + 1] & 0x1F) as u16) << 8) | section[pos + 2] as u16;
        let es_info_length = (((section[pos + 3] & 0x0F) as usize) << 8) | section[pos + 4] as usize;
        pos += 5 + es_info_length;

        if video.is_none() {
            if let Some(tag) = video_stream_tag(stream_type) {
                video = Some((pid, tag.to_string()));
            }
        }
        if audio.is_none() {
            if let Some(tag) = audio_stream_tag(stream_type) {
                audio = Some((pid, tag.to_string()));
            }
        }
    }
    (video, audio)
}

fn video_stream_tag(stream_type: u8) -> Option<&'static str> {
    match stream_type {
        0x01 => Some("mpeg1"),
        0x02 => Some("mpeg2"),
        0x10 => Some("mpeg4"),
        0x1B => Some("avc1"),
        0x24 => Some("hevc"),
        _ => None,
    }
}

fn audio_stream_tag(stream_type: u8) -> Option<&'static str> {
    match stream_type {
        0x03 | 0x04 => Some("mp3"),
        0x0F | 0x11 => Some("aac"),
        _ => None,
    }
}

/// Strip a PES packet's header (start code, stream id, packet length, and
/// the variable optional-fields block) to recover the raw elementary
/// stream bytes that follow. Payload not actually starting with a PES
/// start code is returned unchanged.
fn skip_pes_header(payload: &[u8]) -> Option<&[u8]> {
    if payload.len() < 9 || !payload.starts_with(&[0x00, 0x00, 0x01]) {
        return Some(payload);
    }
    let pes_header_data_length = payload[8] as usize;
    payload.get(9 + pes_header_data_length..)
}

/// Split an Annex-B byte stream on 3-byte start codes (`00 00 01`),
/// returning each NAL unit's raw bytes (header included, start code
/// excluded). Generalizes the shape of
/// [`crate::codec::hevc::extract_nal_units`]'s Annex-B path without baking
/// in a HEVC-specific header interpretation, since this helper must also
/// split raw H.264 NAL streams.
fn split_annex_b(data: &[u8]) -> Vec<&[u8]> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 2 < data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            starts.push(i + 3);
            i += 3;
        } else {
            i += 1;
        }
    }

    let mut units = Vec::new();
    for (idx, &start) in starts.iter().enumerate() {
        let end = match starts.get(idx + 1) {
            // Back off the next start code: 4 bytes if it was 4-byte-coded,
            // otherwise 3.
            Some(&next_start) if next_start >= 4 && data[next_start - 4] == 0 => next_start - 4,
            Some(&next_start) => next_start - 3,
            None => data.len(),
        };
        if end > start {
            units.push(&data[start..end]);
        }
    }
    units
}

fn sps_dimensions(codec: &str, es: &[u8]) -> (u32, u32) {
    let nals = split_annex_b(es);
    match codec {
        "avc1" => {
            for nal in nals {
                if !nal.is_empty() && nal[0] & 0x1F == 7 {
                    if let Some(sps) = avc::parse_sps(nal) {
                        return (sps.width, sps.height);
                    }
                }
            }
        }
        "hevc" => {
            for nal in nals {
                if nal.len() >= 2 && (nal[0] >> 1) & 0x3F == 33 {
                    if let Some(sps) = hevc::parse_sps(nal) {
                        return (sps.width, sps.height);
                    }
                }
            }
        }
        _ => {}
    }
    (0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts_packet(pid: u16, payload_unit_start: bool, payload: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; PACKET_SIZE];
        packet[0] = SYNC_BYTE;
        packet[1] = if payload_unit_start { 0x40 } else { 0x00 } | ((pid >> 8) as u8 & 0x1F);
        packet[2] = (pid & 0xFF) as u8;
        packet[3] = 0x10; // payload only, continuity counter 0
        let n = payload.len().min(PACKET_SIZE - 4);
        packet[4..4 + n].copy_from_slice(&payload[..n]);
        packet
    }

    #[test]
    fn validate_sync_accepts_three_packets() {
        let mut data = ts_packet(0, true, &[]);
        data.extend(ts_packet(0, true, &[]));
        data.extend(ts_packet(0, true, &[]));
        assert!(validate_sync(&data).is_ok());
    }

    #[test]
    fn validate_sync_rejects_bad_magic() {
        let data = vec![0u8; PACKET_SIZE];
        assert!(validate_sync(&data).is_err());
    }

    fn pat_section(pmt_pid: u16) -> Vec<u8> {
        let mut section = vec![0x00u8]; // table_id
        section.extend_from_slice(&[0xB0, 0x0D]); // syntax indicator + section_length=13
        section.extend_from_slice(&[0x00, 0x01]); // transport_stream_id
        section.push(0xC1); // version/current_next
        section.push(0x00); // section_number
        section.push(0x00); // last_section_number
        section.extend_from_slice(&[0x00, 0x01]); // program_number = 1
        section.extend_from_slice(&[(0xE0 | (pmt_pid >> 8) as u8), (pmt_pid & 0xFF) as u8]);
        section.extend_from_slice(&[0, 0, 0, 0]); // CRC32 placeholder
        section
    }

    #[test]
    fn parse_pat_finds_pmt_pid() {
        let section = pat_section(0x1234 & 0x1FFF);
        assert_eq!(parse_pat(&section), Some(0x1234 & 0x1FFF));
    }

    #[test]
    fn video_and_audio_stream_tags() {
        assert_eq!(video_stream_tag(0x1B), Some("avc1"));
        assert_eq!(video_stream_tag(0x24), Some("hevc"));
        assert_eq!(audio_stream_tag(0x0F), Some("aac"));
        assert_eq!(audio_stream_tag(0xFF), None);
    }

    #[test]
    fn skip_pes_header_finds_es_start() {
        let mut payload = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x00, 0x00];
        payload.extend_from_slice(&[0x00, 0x00, 0x01, 0x67]); // ES bytes, SPS-like start code
        let es = skip_pes_header(&payload).unwrap();
        assert_eq!(&es[0..3], &[0x00, 0x00, 0x01]);
    }

    #[test]
    fn split_annex_b_two_nals() {
        let data = [0x00, 0x00, 0x01, 0x67, 0xAA, 0x00, 0x00, 0x01, 0x68, 0xBB];
        let nals = split_annex_b(&data);
        assert_eq!(nals.len(), 2);
        assert_eq!(nals[0], &[0x67, 0xAA]);
        assert_eq!(nals[1], &[0x68, 0xBB]);
    }

    #[test]
    fn no_video_stream_in_pmt_is_fatal() {
        let mut section = vec![0x02u8]; // table_id
        section.extend_from_slice(&[0xB0, 0x12]); // section_length = 18
        section.extend_from_slice(&[0x00, 0x01]); // program_number
        section.push(0xC1);
        section.push(0x00);
        section.push(0x00);
        section.extend_from_slice(&[0xE1, 0x00]); // PCR_PID
        section.extend_from_slice(&[0xF0, 0x00]); // program_info_length = 0
        // one audio-only stream entry: streamType 0x0F (AAC)
        section.push(0x0F);
        section.extend_from_slice(&[0xE1, 0x00]); // elementary PID
        section.extend_from_slice(&[0xF0, 0x00]); // ES info length
        section.extend_from_slice(&[0, 0, 0, 0]); // CRC32 placeholder

        let (video, audio) = parse_pmt(&section);
        assert!(video.is_none());
        assert!(audio.is_some());
    }
}
