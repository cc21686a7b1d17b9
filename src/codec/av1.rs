//! AV1 `av1C` configuration record heuristics.

use crate::color;
use crate::types::ColorInfo;

#[derive(Debug, Clone, Default)]
pub struct Av1Info {
    pub profile: u8,
    pub color: ColorInfo,
}

/// Parse an `av1C` box payload. Byte 0 is `0x81` plus the 7-bit version;
/// byte 1's top 3 bits are `seq_profile`, bit 0x04 signals high bit depth.
/// Either the flag bit or `profile >= 2` triggers the HDR10 heuristic.
pub fn parse_av1_config(data: &[u8]) -> Option<Av1Info> {
    if data.len() < 2 {
        return None;
    }
    let profile = (data[1] >> 5) & 0x07;
    let mut info_color = color::av1_flag_color_hint(data[1]);
    if info_color.is_empty() && profile >= 2 {
        info_color = color::av1_flag_color_hint(0x04);
    }
    Some(Av1Info {
        profile,
        color: info_color,
    })
}
