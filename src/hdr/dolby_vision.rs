//! Dolby Vision configuration record parsing (`dvcC`/`dvvC`).
//!
//! Only the configuration record fields named by the color detector are in
//! scope here; full RPU bitstream parsing is a separate, much larger
//! problem this crate does not attempt.

use crate::types::DolbyVisionInfo;

/// Parse a Dolby Vision configuration record.
///
/// `data` may be the raw record bytes, or may still carry a leading
/// `size`+`dvcC`/`dvvC` box header, in which case the header is skipped.
///
/// Layout (Dolby Vision bitstreams within the ISO BMFF file format):
/// - dv_version_major (8 bits), dv_version_minor (8 bits)
/// - dv_profile (7 bits), dv_level (6 bits) split across two bytes
/// - rpu_present_flag / el_present_flag / bl_present_flag (1 bit each)
/// - dv_bl_signal_compatibility_id (4 bits)
pub fn parse_dv_config(data: &[u8]) -> Option<DolbyVisionInfo> {
    if data.len() < 4 {
        return None;
    }

    let config = if data.len() >= 8 && (&data[4..8] == b"dvcC" || &data[4..8] == b"dvvC") {
        &data[8..]
    } else {
        data
    };

    if config.len() < 4 {
        return None;
    }

    let profile = (config[2] >> 1) & 0x7F;
    let level = ((config[2] & 0x01) << 5) | ((config[3] >> 3) & 0x1F);
    let rpu_present = (config[3] & 0x04) != 0;
    let el_present = (config[3] & 0x02) != 0;
    let bl_compatibility_id = config.get(4).map(|b| (b >> 4) & 0x0F);

    if profile > 10 {
        return None;
    }

    Some(DolbyVisionInfo {
        profile,
        level,
        rpu_present,
        el_present,
        bl_compatibility_id,
    })
}

/// HEVC uses NAL unit type 62 for the Dolby Vision RPU.
pub fn is_dv_rpu_nal(nal_type: u8) -> bool {
    nal_type == 62
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_7_level_from_raw_bytes() {
        // profile=7 (0b0000111), level=6 (0b000110), rpu+el present.
        let profile_bits = 7u8 << 1; // low bit of byte 3 carries level's top bit
        let level = 6u8;
        let byte2 = profile_bits | (level >> 5);
        let byte3 = ((level & 0x1F) << 3) | 0x04 | 0x02;
        let data = [1, 0, byte2, byte3, 0x40];
        let dv = parse_dv_config(&data).unwrap();
        assert_eq!(dv.profile, 7);
        assert_eq!(dv.level, 6);
        assert!(dv.rpu_present);
        assert!(dv.el_present);
        assert_eq!(dv.bl_compatibility_id, Some(4));
    }

    #[test]
    fn skips_box_header_when_present() {
        let mut data = vec![0, 0, 0, 20];
        data.extend_from_slice(b"dvcC");
        data.extend_from_slice(&[1, 0, 7 << 1, 0]);
        assert!(parse_dv_config(&data).is_some());
    }

    #[test]
    fn rejects_out_of_range_profile() {
        let data = [1, 0, 0xFE, 0];
        assert!(parse_dv_config(&data).is_none());
    }

    #[test]
    fn too_short_yields_none() {
        assert!(parse_dv_config(&[1, 2]).is_none());
    }
}
