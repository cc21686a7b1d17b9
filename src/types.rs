//! Core data model: color/HDR description, timing, and the per-track and
//! container-level metadata records described in spec §3.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ITU-T H.273 matrix coefficients, mapped to the short string tags used
/// throughout the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatrixCoefficients {
    Identity,
    Bt709,
    Fcc,
    Bt470Bg,
    Bt601,
    Smpte240M,
    YCgCo,
    Bt2020Ncl,
    Bt2020Cl,
    Smpte2085,
    ChromaDerivedNcl,
    ChromaDerivedCl,
    ICtCp,
    Unspecified,
}

impl MatrixCoefficients {
    pub fn from_h273(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Identity,
            1 => Self::Bt709,
            2 => Self::Unspecified,
            4 => Self::Fcc,
            5 => Self::Bt470Bg,
            6 => Self::Bt601,
            7 => Self::Smpte240M,
            8 => Self::YCgCo,
            9 => Self::Bt2020Ncl,
            10 => Self::Bt2020Cl,
            11 => Self::Smpte2085,
            12 => Self::ChromaDerivedNcl,
            13 => Self::ChromaDerivedCl,
            14 => Self::ICtCp,
            _ => return None,
        })
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Identity => "rgb",
            Self::Bt709 => "bt709",
            Self::Fcc => "fcc",
            Self::Bt470Bg => "bt470bg",
            Self::Bt601 => "bt601",
            Self::Smpte240M => "smpte240m",
            Self::YCgCo => "ycgco",
            Self::Bt2020Ncl => "bt2020nc",
            Self::Bt2020Cl => "bt2020c",
            Self::Smpte2085 => "smpte2085",
            Self::ChromaDerivedNcl => "chroma-derived-nc",
            Self::ChromaDerivedCl => "chroma-derived-c",
            Self::ICtCp => "ictcp",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for MatrixCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// ITU-T H.273 transfer characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransferCharacteristics {
    Bt709,
    Gamma22,
    Gamma28,
    Bt601,
    Smpte240M,
    Linear,
    Log100,
    Log316,
    Iec61966_2_4,
    Bt1361,
    Srgb,
    Bt2020Ten,
    Bt2020Twelve,
    Smpte2084,
    Smpte428,
    Hlg,
    Unspecified,
}

impl TransferCharacteristics {
    pub fn from_h273(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::Bt709,
            2 => Self::Unspecified,
            4 => Self::Gamma22,
            5 => Self::Gamma28,
            6 => Self::Bt601,
            7 => Self::Smpte240M,
            8 => Self::Linear,
            9 => Self::Log100,
            10 => Self::Log316,
            11 => Self::Iec61966_2_4,
            12 => Self::Bt1361,
            13 => Self::Srgb,
            14 => Self::Bt2020Ten,
            15 => Self::Bt2020Twelve,
            16 => Self::Smpte2084,
            17 => Self::Smpte428,
            18 => Self::Hlg,
            _ => return None,
        })
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Bt709 => "bt709",
            Self::Gamma22 => "gamma22",
            Self::Gamma28 => "gamma28",
            Self::Bt601 => "bt601",
            Self::Smpte240M => "smpte240m",
            Self::Linear => "linear",
            Self::Log100 => "log100",
            Self::Log316 => "log316",
            Self::Iec61966_2_4 => "iec61966-2-4",
            Self::Bt1361 => "bt1361",
            Self::Srgb => "srgb",
            Self::Bt2020Ten => "bt2020-10",
            Self::Bt2020Twelve => "bt2020-12",
            Self::Smpte2084 => "smpte2084",
            Self::Smpte428 => "smpte428",
            Self::Hlg => "hlg",
            Self::Unspecified => "unspecified",
        }
    }

    pub fn is_pq(&self) -> bool {
        matches!(self, Self::Smpte2084)
    }

    pub fn is_hlg(&self) -> bool {
        matches!(self, Self::Hlg)
    }
}

impl fmt::Display for TransferCharacteristics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// ITU-T H.273 color primaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColorPrimaries {
    Bt709,
    Bt470M,
    Bt470Bg,
    Bt601,
    Smpte240M,
    Film,
    Bt2020,
    Smpte428,
    Smpte431,
    Smpte432,
    JedecP22,
    Unspecified,
}

impl ColorPrimaries {
    pub fn from_h273(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::Bt709,
            2 => Self::Unspecified,
            4 => Self::Bt470M,
            5 => Self::Bt470Bg,
            6 => Self::Bt601,
            7 => Self::Smpte240M,
            8 => Self::Film,
            9 => Self::Bt2020,
            10 => Self::Smpte428,
            11 => Self::Smpte431,
            12 => Self::Smpte432,
            22 => Self::JedecP22,
            _ => return None,
        })
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Bt709 => "bt709",
            Self::Bt470M => "bt470m",
            Self::Bt470Bg => "bt470bg",
            Self::Bt601 => "bt601",
            Self::Smpte240M => "smpte240m",
            Self::Film => "film",
            Self::Bt2020 => "bt2020",
            Self::Smpte428 => "smpte428",
            Self::Smpte431 => "smpte431",
            Self::Smpte432 => "smpte432",
            Self::JedecP22 => "jedec-p22",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for ColorPrimaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// SMPTE ST.2086 mastering display metadata, decoded verbatim from `mdcv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MasteringDisplay {
    /// [G, B, R] chromaticity coordinates, each [x, y] in units of 0.00002.
    pub primaries: [[u16; 2]; 3],
    pub white_point: [u16; 2],
    /// In units of 0.0001 cd/m².
    pub max_luminance: u32,
    pub min_luminance: u32,
}

/// Content light level info decoded from `clli`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContentLightLevel {
    pub max_cll: u16,
    pub max_fall: u16,
}

/// Dolby Vision configuration record detail (profile/level/layer presence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DolbyVisionInfo {
    pub profile: u8,
    pub level: u8,
    pub rpu_present: bool,
    pub el_present: bool,
    pub bl_compatibility_id: Option<u8>,
}

/// Normalized color/HDR description of one video track.
///
/// Every field is absent unless the source container/codec actually
/// carried it; `isHDR` (see [`is_hdr`]) never returns true from missing
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorInfo {
    pub matrix_coefficients: Option<MatrixCoefficients>,
    pub transfer_characteristics: Option<TransferCharacteristics>,
    pub primaries: Option<ColorPrimaries>,
    pub full_range: Option<bool>,
}

impl ColorInfo {
    pub const fn empty() -> Self {
        Self {
            matrix_coefficients: None,
            transfer_characteristics: None,
            primaries: None,
            full_range: None,
        }
    }

    /// True if this ColorInfo has no non-absent fields at all.
    pub fn is_empty(&self) -> bool {
        self.matrix_coefficients.is_none()
            && self.transfer_characteristics.is_none()
            && self.primaries.is_none()
            && self.full_range.is_none()
    }

    /// Fill in any field that is currently absent from `self`. Matches the
    /// "first box that yields non-absent color fields wins" rule in
    /// spec §4.4: later boxes never overwrite earlier ones.
    pub fn merge_missing(&mut self, other: &ColorInfo) {
        if self.matrix_coefficients.is_none() {
            self.matrix_coefficients = other.matrix_coefficients;
        }
        if self.transfer_characteristics.is_none() {
            self.transfer_characteristics = other.transfer_characteristics;
        }
        if self.primaries.is_none() {
            self.primaries = other.primaries;
        }
        if self.full_range.is_none() {
            self.full_range = other.full_range;
        }
    }
}

/// HDR classification, implementing the spec §3 `isHDR` invariant.
pub fn is_hdr(color: &ColorInfo) -> bool {
    use ColorPrimaries::Bt2020;
    use MatrixCoefficients::{Bt2020Cl, Bt2020Ncl, ICtCp};
    use TransferCharacteristics::{Hlg, Smpte2084};

    let dolby_vision = color.transfer_characteristics == Some(Smpte2084)
        && color.matrix_coefficients == Some(ICtCp);

    let (Some(primaries), Some(transfer)) = (color.primaries, color.transfer_characteristics)
    else {
        return dolby_vision;
    };

    let hdr10 = primaries == Bt2020
        && transfer == Smpte2084
        && matches!(color.matrix_coefficients, Some(Bt2020Ncl | Bt2020Cl | ICtCp));

    let hlg = primaries == Bt2020 && transfer == Hlg;

    hdr10 || hlg || dolby_vision
}

/// `(sampleCount, sampleDuration)` pairs plus the timescale and total
/// duration needed to reconstruct FPS from an ISO BMFF `stts` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingInfo {
    pub timescale: u32,
    pub entries: Vec<(u32, u32)>,
    pub duration_ticks: u64,
    pub sample_count: u64,
}

/// Orientation derived from rotation + natural orientation (spec §4.8 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    Landscape,
    LandscapeRight,
    LandscapeLeft,
}

/// Coarse natural orientation derived purely from pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NaturalOrientation {
    Portrait,
    Landscape,
}

/// Geotag parsed from an ISO 6709 location string.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Container tag, one per supported format plus `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Container {
    Mp4,
    Mov,
    WebM,
    Mkv,
    Avi,
    Ts,
    #[default]
    Unknown,
}

impl Container {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::WebM => "webm",
            Self::Mkv => "mkv",
            Self::Avi => "avi",
            Self::Ts => "ts",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Per-track intermediate record produced by each container parser.
#[derive(Debug, Clone, Default)]
pub struct VideoTrackMetadata {
    pub width: u32,
    pub height: u32,
    pub rotation: u16,
    pub display_aspect_width: u32,
    pub display_aspect_height: u32,
    pub codec: String,
    pub fps: Option<f64>,
    pub color: ColorInfo,
    pub hdr10_plus: bool,
    pub dolby_vision: Option<DolbyVisionInfo>,
    pub mastering_display: Option<MasteringDisplay>,
    pub content_light_level: Option<ContentLightLevel>,
    pub video_bitrate: Option<u64>,
    pub audio_bitrate: Option<u64>,
}

/// Container-level parsed metadata, before assembly into the public
/// [`VideoInfoResult`].
#[derive(Debug, Clone, Default)]
pub struct ParsedVideoMetadata {
    pub container: Container,
    pub track: VideoTrackMetadata,
    pub has_audio: bool,
    pub audio_channels: u32,
    pub audio_sample_rate: u32,
    pub audio_codec: String,
    pub duration: f64,
    pub file_size: u64,
    pub bitrate: Option<u64>,
    pub location: Option<Location>,
}

/// Caller-supplied knobs for [`crate::parse_video_metadata`]. `headers` is
/// carried only for the benefit of collaborators that may need to re-fetch
/// the source (a secondary HTTP request, say); this crate never looks at
/// it, since it never performs I/O of its own.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub headers: std::collections::HashMap<String, String>,
}

/// Public result record returned by [`crate::parse_video_metadata`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VideoInfoResult {
    pub duration: f64,
    pub has_audio: bool,
    pub is_hdr: Option<bool>,
    pub width: u32,
    pub height: u32,
    pub fps: Option<f64>,
    pub bit_rate: u64,
    pub file_size: u64,
    pub codec: String,
    pub orientation: Orientation,
    pub natural_orientation: NaturalOrientation,
    pub aspect_ratio: Option<f64>,
    pub is_16_9: bool,
    pub audio_sample_rate: u32,
    pub audio_channels: u32,
    pub audio_codec: String,
    pub location: Option<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hdr10_requires_exact_combination() {
        let mut c = ColorInfo {
            primaries: Some(ColorPrimaries::Bt2020),
            transfer_characteristics: Some(TransferCharacteristics::Smpte2084),
            matrix_coefficients: Some(MatrixCoefficients::Bt2020Ncl),
            full_range: Some(false),
        };
        assert!(is_hdr(&c));

        c.matrix_coefficients = Some(MatrixCoefficients::Bt709);
        assert!(!is_hdr(&c));
    }

    #[test]
    fn hlg_ignores_matrix() {
        let c = ColorInfo {
            primaries: Some(ColorPrimaries::Bt2020),
            transfer_characteristics: Some(TransferCharacteristics::Hlg),
            matrix_coefficients: None,
            full_range: None,
        };
        assert!(is_hdr(&c));
    }

    #[test]
    fn dolby_vision_ictcp_without_primaries() {
        let c = ColorInfo {
            primaries: None,
            transfer_characteristics: Some(TransferCharacteristics::Smpte2084),
            matrix_coefficients: Some(MatrixCoefficients::ICtCp),
            full_range: None,
        };
        assert!(is_hdr(&c));
    }

    #[test]
    fn missing_fields_never_yield_true() {
        assert!(!is_hdr(&ColorInfo::empty()));
    }

    #[test]
    fn sdr_bt709_is_not_hdr() {
        let c = ColorInfo {
            primaries: Some(ColorPrimaries::Bt709),
            transfer_characteristics: Some(TransferCharacteristics::Bt709),
            matrix_coefficients: Some(MatrixCoefficients::Bt709),
            full_range: Some(false),
        };
        assert!(!is_hdr(&c));
    }
}
