//! Error taxonomy for container parsing and metadata extraction.
//!
//! Only the five kinds named by the spec are fatal at the call boundary;
//! everything else a parser encounters inside an optional sub-tree is
//! recovered from by leaving the affected field absent (see the
//! `recoverable` helpers on [`ProbeError`]).

/// Errors that can escape [`crate::parse_video_metadata`].
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The container signature did not match any known format, or WebM/MKV
    /// DocType discrimination failed.
    #[error("unsupported container{}", context_suffix(.context))]
    UnsupportedContainer { context: Option<String> },

    /// A required top-level structure (moov, Segment, RIFF hdrl, TS sync)
    /// was truncated before it could be fully read.
    #[error("truncated input in {container} at offset {offset:?}: {what}")]
    TruncatedInput {
        container: &'static str,
        what: String,
        offset: Option<u64>,
    },

    /// Sizes were inconsistent, sanity bounds were exceeded, or a VINT/ID
    /// was malformed, in a context the parser could not recover from.
    #[error("malformed structure in {container} at offset {offset:?}: {what}")]
    MalformedStructure {
        container: &'static str,
        what: String,
        offset: Option<u64>,
    },

    /// A container that requires a video stream (AVI, TS) had none.
    #[error("no video track found in {container}")]
    NoVideoTrack { container: &'static str },

    /// The binary reader hit `ReadBeyondBounds` on a required primitive
    /// read at the top level.
    #[error("read past end of input in {container} at offset {offset:?}: {what}")]
    ReadError {
        container: &'static str,
        what: String,
        offset: Option<u64>,
    },
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(c) => format!(": {c}"),
        None => String::new(),
    }
}

/// Internal bounds-check error raised by [`crate::reader::ByteReader`].
///
/// Higher-level parsers treat this as a recoverable signal inside optional
/// sub-trees (the affected field is left absent) and convert it to a fatal
/// [`ProbeError`] only for required top-level structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBeyondBounds {
    pub requested: usize,
    pub remaining: usize,
    pub offset: u64,
}

impl std::fmt::Display for ReadBeyondBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requested {} bytes at offset {} with only {} remaining",
            self.requested, self.offset, self.remaining
        )
    }
}

impl std::error::Error for ReadBeyondBounds {}

pub(crate) fn log_recoverable(container: &str, what: &str, err: impl std::fmt::Display) {
    #[cfg(feature = "tracing")]
    tracing::debug!(container, what, error = %err, "skipping malformed optional element");
    #[cfg(not(feature = "tracing"))]
    let _ = (container, what, err);
}
