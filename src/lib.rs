//! # sceneforged-probe-core
//!
//! Pure Rust container demuxing and video metadata extraction, without
//! decoding media payloads.
//!
//! Dimensions, duration, frame rate, codec identification, rotation,
//! pixel/display aspect, HDR color characteristics, audio channel and
//! sample-rate information, and recording-location tags are recovered
//! directly from container structure (`moov`/`trak` boxes, EBML elements,
//! PSI tables, RIFF chunks) without ever decoding a compressed sample.
//!
//! ## Supported containers
//!
//! - MP4 / ISO BMFF (`container::mp4`)
//! - QuickTime MOV (`container::mov`)
//! - WebM / Matroska (`container::mkv`)
//! - MPEG Transport Stream (`container::ts`)
//! - AVI / RIFF (`container::avi`)
//!
//! ## Example
//!
//! ```no_run
//! let data = std::fs::read("movie.mp4").unwrap();
//! let options = sceneforged_probe_core::Options::default();
//! let info = sceneforged_probe_core::parse_video_metadata(&data, &options).unwrap();
//! println!("{}x{} {} {:.2}s", info.width, info.height, info.codec, info.duration);
//! ```

pub mod bbox;
pub mod codec;
pub mod color;
pub mod container;
pub mod ebml;
pub mod error;
pub mod fps;
pub mod hdr;
pub mod reader;
pub mod types;

pub use error::ProbeError;
pub use types::*;

/// Parse an in-memory container buffer into the public result record.
///
/// Input acquisition (opening files, following URLs, re-fetching with
/// `options.headers`) is left to the caller; this core only ever reads the
/// buffer it is handed and ignores `options` beyond accepting it.
pub fn parse_video_metadata(data: &[u8], options: &Options) -> Result<VideoInfoResult, ProbeError> {
    let _ = options;
    container::parse_video_metadata(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_is_an_error() {
        let result = parse_video_metadata(&[0u8; 64], &Options::default());
        assert!(matches!(result, Err(ProbeError::UnsupportedContainer { .. })));
    }
}
