//! FPS reconstruction from an ISO BMFF `stts` time-to-sample table.
//!
//! New module (the teacher never computed FPS), written in the teacher's
//! `Option`-returning, sanity-bounded parse idiom used throughout
//! `codec/hevc/mod.rs::parse_hevc_config`.

use crate::reader::ByteReader;
use crate::types::TimingInfo;

/// Maximum `stts` entries accepted; spec §5 sanity bound.
const MAX_STTS_ENTRIES: u32 = 10_000;

/// Nominal frame rates FPS is snapped to when within tolerance.
const NOMINAL_RATES: &[f64] = &[
    23.976, 24.0, 25.0, 29.97, 30.0, 48.0, 50.0, 59.94, 60.0, 90.0, 120.0, 144.0, 165.0, 240.0,
];

const SNAP_TOLERANCE: f64 = 0.01;

/// Parse an ISO BMFF `stts` box payload (including its 4-byte
/// version+flags header) into a [`TimingInfo`].
///
/// Returns `None` when the entry count is zero, exceeds the sanity bound,
/// or every entry is degenerate (zero count or zero duration).
pub fn parse_mp4_timing_info(
    stts_payload: &[u8],
    timescale: u32,
    duration_ticks: u64,
) -> Option<TimingInfo> {
    let mut r = ByteReader::new(stts_payload);
    r.skip(4).ok()?; // version + flags
    let entry_count = r.read_u32().ok()?;
    if entry_count == 0 || entry_count > MAX_STTS_ENTRIES {
        return None;
    }

    let mut entries = Vec::with_capacity(entry_count as usize);
    let mut sample_count: u64 = 0;
    for _ in 0..entry_count {
        let count = r.read_u32().ok()?;
        let delta = r.read_u32().ok()?;
        if count == 0 || delta == 0 {
            continue;
        }
        sample_count += count as u64;
        entries.push((count, delta));
    }

    if entries.is_empty() {
        return None;
    }

    Some(TimingInfo {
        timescale,
        entries,
        duration_ticks,
        sample_count,
    })
}

/// Compute the weighted-average FPS from a [`TimingInfo`], snapped to the
/// nearest nominal rate (or its 2x/0.5x variant) within tolerance.
pub fn calculate_fps(timing: &TimingInfo) -> Option<f64> {
    if timing.timescale == 0 {
        return None;
    }

    let total_count: u128 = timing.entries.iter().map(|(c, _)| *c as u128).sum();
    let weighted_duration: u128 = timing
        .entries
        .iter()
        .map(|(c, d)| *c as u128 * *d as u128)
        .sum();

    if total_count == 0 || weighted_duration == 0 {
        return None;
    }

    let avg_frame_duration = weighted_duration as f64 / total_count as f64;
    let raw_fps = timing.timescale as f64 / avg_frame_duration;

    snap_fps_checked(raw_fps)
}

/// Snap `fps` to the nearest nominal rate (or 2x/0.5x of one) within
/// tolerance; otherwise round to 3 decimal places within [10, 240], else
/// return the raw value unchanged. Idempotent: `snap(snap(x)) == snap(x)`.
pub fn snap_fps(fps: f64) -> f64 {
    snap_fps_checked(fps).unwrap_or(fps)
}

/// Same snapping rule as [`snap_fps`], but returns `None` (instead of the
/// raw value) when `fps` neither snaps to a nominal rate nor falls inside
/// `[10, 240]` — the "returned as absent" case from spec §4.3.
fn snap_fps_checked(fps: f64) -> Option<f64> {
    if let Some(nominal) = closest_within_tolerance(fps, 1.0) {
        return Some(nominal);
    }
    if let Some(nominal) = closest_within_tolerance(fps, 2.0) {
        return Some(nominal);
    }
    if let Some(nominal) = closest_within_tolerance(fps, 0.5) {
        return Some(nominal);
    }
    if (10.0..=240.0).contains(&fps) {
        return Some((fps * 1000.0).round() / 1000.0);
    }
    None
}

fn closest_within_tolerance(fps: f64, scale: f64) -> Option<f64> {
    NOMINAL_RATES
        .iter()
        .map(|n| n * scale)
        .find(|scaled| (fps - scaled).abs() < SNAP_TOLERANCE)
}
