//! Dolby Vision configuration record detection.
//!
//! HEVC NAL-level HDR detection (SPS VUI, SEI mastering display/CLL/HDR10+)
//! lives in [`crate::codec::hevc`]; this module covers only the separate
//! `dvcC`/`dvvC` configuration record.

pub mod dolby_vision;

pub use dolby_vision::{is_dv_rpu_nal, parse_dv_config};
