//! HDR/Color detector: per-container dispatch to a normalized [`ColorInfo`].
//!
//! Grounded on `sceneforged-probe/src/hdr/bitstream.rs`'s box-tag dispatch
//! and `src/types.rs`'s H.273 numeric tables, generalized to cover every
//! box/element this crate's container parsers hand it rather than only the
//! HEVC-specific set the teacher supported.

use crate::reader::ByteReader;
use crate::types::{ColorInfo, ColorPrimaries, ContentLightLevel, MasteringDisplay, MatrixCoefficients, TransferCharacteristics};

/// Luminance/CLL thresholds above which an otherwise-ambiguous box is
/// classified as HDR.
const MDCV_HDR_LUMINANCE: u32 = 1_000_000; // 1000 nits, units of 0.0001 cd/m^2
const CLLI_HDR_NITS: u16 = 1000;

/// Parse a single `colr`/`mdcv`/`clli`/Dolby-Vision-config box payload, or a
/// codec configuration record, into a [`ColorInfo`].
///
/// `payload` is the box content *without* the 8-byte box header. Any parse
/// failure yields [`ColorInfo::empty`] rather than propagating an error, per
/// the "no exceptions escape" failure semantics for this component.
pub fn parse_mp4_color_info(box_type: &[u8; 4], payload: &[u8]) -> ColorInfo {
    match box_type {
        b"colr" => parse_colr(payload),
        b"mdcv" => parse_mdcv(payload),
        b"clli" => parse_clli(payload),
        b"dovi" | b"dvcC" | b"dvvC" => dolby_vision_color_hint(),
        b"rICC" | b"prof" => full_range_rgb_hint(),
        _ => ColorInfo::empty(),
    }
}

/// Detect a codec configuration record from its first two bytes and
/// dispatch to the matching per-codec heuristic, per the MP4 dispatch rule.
pub fn parse_config_record_prefix(bytes: &[u8]) -> Option<ColorInfo> {
    if bytes.len() < 2 {
        return None;
    }
    match (bytes[0], bytes[1]) {
        // HEVCDecoderConfigurationRecord also starts with version=1 but
        // carries profile byte 0x22 (Main 10, profile_space=0, tier=0).
        (1, 0x22) => Some(hevc_profile_color_hint(0x22 & 0x1F)),
        // AVCDecoderConfigurationRecord: configurationVersion=1, profile byte follows.
        (1, profile) => Some(avc_profile_color_hint(profile)),
        (0x81, flags) => Some(av1_flag_color_hint(flags)),
        (0x91, _) => Some(vp9_profile_color_hint(bytes)),
        _ => None,
    }
}

fn parse_colr(payload: &[u8]) -> ColorInfo {
    let mut r = ByteReader::new(payload);
    let Ok(tag) = r.read_tag() else {
        return ColorInfo::empty();
    };
    if &tag != b"nclx" && &tag != b"nclc" {
        return ColorInfo::empty();
    }
    let (Ok(primaries), Ok(transfer), Ok(matrix)) =
        (r.read_u16(), r.read_u16(), r.read_u16())
    else {
        return ColorInfo::empty();
    };
    let full_range = if &tag == b"nclx" {
        r.read_u8().ok().map(|b| (b & 0x80) != 0)
    } else {
        None
    };
    ColorInfo {
        primaries: ColorPrimaries::from_h273(primaries),
        transfer_characteristics: TransferCharacteristics::from_h273(transfer),
        matrix_coefficients: MatrixCoefficients::from_h273(matrix),
        full_range,
    }
}

/// Decode the `mdcv` payload into a [`MasteringDisplay`] record, returning a
/// [`ColorInfo`] that marks HDR-BT2020/PQ when the peak luminance exceeds
/// the threshold (the box carries no primaries/transfer codes of its own).
pub fn parse_mdcv_display(payload: &[u8]) -> Option<MasteringDisplay> {
    let mut r = ByteReader::new(payload);
    let mut primaries = [[0u16; 2]; 3];
    for entry in &mut primaries {
        entry[0] = r.read_u16().ok()?;
        entry[1] = r.read_u16().ok()?;
    }
    let white_point = [r.read_u16().ok()?, r.read_u16().ok()?];
    let max_luminance = r.read_u32().ok()?;
    let min_luminance = r.read_u32().ok()?;
    Some(MasteringDisplay {
        primaries,
        white_point,
        max_luminance,
        min_luminance,
    })
}

fn parse_mdcv(payload: &[u8]) -> ColorInfo {
    match parse_mdcv_display(payload) {
        Some(d) if d.max_luminance > MDCV_HDR_LUMINANCE => hdr10_hint(),
        _ => ColorInfo::empty(),
    }
}

/// Decode the `clli` payload into a [`ContentLightLevel`] record.
pub fn parse_clli_levels(payload: &[u8]) -> Option<ContentLightLevel> {
    let mut r = ByteReader::new(payload);
    let max_cll = r.read_u16().ok()?;
    let max_fall = r.read_u16().ok()?;
    Some(ContentLightLevel { max_cll, max_fall })
}

fn parse_clli(payload: &[u8]) -> ColorInfo {
    match parse_clli_levels(payload) {
        Some(l) if l.max_cll > CLLI_HDR_NITS => hdr10_hint(),
        _ => ColorInfo::empty(),
    }
}

/// The HDR10 color hint (BT.2020 primaries, PQ transfer, BT.2020 NCL
/// matrix) used wherever a codec-config heuristic detects HDR10 without
/// decoding a full `colr`/`mdcv` box.
pub(crate) fn hdr10_hint() -> ColorInfo {
    ColorInfo {
        primaries: Some(ColorPrimaries::Bt2020),
        transfer_characteristics: Some(TransferCharacteristics::Smpte2084),
        matrix_coefficients: Some(MatrixCoefficients::Bt2020Ncl),
        full_range: None,
    }
}

fn dolby_vision_color_hint() -> ColorInfo {
    ColorInfo {
        primaries: None,
        transfer_characteristics: Some(TransferCharacteristics::Smpte2084),
        matrix_coefficients: Some(MatrixCoefficients::ICtCp),
        full_range: None,
    }
}

fn full_range_rgb_hint() -> ColorInfo {
    ColorInfo {
        primaries: Some(ColorPrimaries::Bt709),
        transfer_characteristics: None,
        matrix_coefficients: Some(MatrixCoefficients::Identity),
        full_range: Some(true),
    }
}

pub(crate) fn avc_profile_color_hint(profile_idc: u8) -> ColorInfo {
    match profile_idc {
        110 | 122 => hdr10_hint(),
        100 | 118 | 44 | 66 | 77 | 82 | 88 => ColorInfo {
            primaries: Some(ColorPrimaries::Bt709),
            transfer_characteristics: Some(TransferCharacteristics::Bt709),
            matrix_coefficients: Some(MatrixCoefficients::Bt709),
            full_range: None,
        },
        _ => ColorInfo::empty(),
    }
}

fn hevc_profile_color_hint(profile_idc: u8) -> ColorInfo {
    if profile_idc == 2 {
        hdr10_hint()
    } else {
        ColorInfo::empty()
    }
}

pub(crate) fn av1_flag_color_hint(flags: u8) -> ColorInfo {
    if flags & 0x04 != 0 {
        hdr10_hint()
    } else {
        ColorInfo::empty()
    }
}

fn vp9_profile_color_hint(bytes: &[u8]) -> ColorInfo {
    let profile = bytes.first().map(|b| b & 0x0F).unwrap_or(0);
    let bit_depth = bytes.get(2).copied().unwrap_or(0);
    if profile >= 2 && bit_depth >= 10 {
        hdr10_hint()
    } else {
        ColorInfo::empty()
    }
}

/// WebM `Colour` element ids (spec §4.2).
mod webm_ids {
    pub const MATRIX_COEFFICIENTS: u64 = 0x55B1;
    pub const BITS_PER_CHANNEL: u64 = 0x55B2;
    pub const TRANSFER_CHARACTERISTICS: u64 = 0x55B9;
    pub const PRIMARIES: u64 = 0x55BA;
}

/// Parse a WebM `Colour` master element's children (already split into
/// `(id, payload)` pairs by the EBML walker) into a [`ColorInfo`].
pub fn parse_webm_color_info(children: &[(u64, &[u8])]) -> ColorInfo {
    let mut color = ColorInfo::empty();
    for (id, payload) in children {
        match *id {
            webm_ids::MATRIX_COEFFICIENTS => {
                if let Some(&v) = payload.first() {
                    color.matrix_coefficients = MatrixCoefficients::from_h273(v as u16);
                }
            }
            webm_ids::TRANSFER_CHARACTERISTICS => {
                if let Some(&v) = payload.first() {
                    color.transfer_characteristics = TransferCharacteristics::from_h273(v as u16);
                }
            }
            webm_ids::PRIMARIES => {
                if let Some(&v) = payload.first() {
                    color.primaries = ColorPrimaries::from_h273(v as u16);
                }
            }
            webm_ids::BITS_PER_CHANNEL => {
                if let Some(&v) = payload.first() {
                    color.full_range = Some(v == 0);
                }
            }
            _ => {}
        }
    }
    color
}
