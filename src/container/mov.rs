//! QuickTime MOV container parsing: a thin wrapper over the MP4 box walker
//! that tags the result as [`Container::Mov`] so `tapt`/`clef`/`clap`
//! aperture handling in `mp4.rs` is applied.
//!
//! Grounded on spec §2 item 5 ("QuickTime parser extends MP4"); MOV carries
//! no additional box types beyond the aperture overrides already handled in
//! [`crate::container::mp4`].

use crate::error::ProbeError;
use crate::types::{Container, ParsedVideoMetadata};

pub fn parse(data: &[u8]) -> Result<ParsedVideoMetadata, ProbeError> {
    super::mp4::parse(data, Container::Mov)
}
