//! Bounded duration generator.

use crate::source::RandomSource;
use protobuf::well_known_types::duration::Duration;

/// Seconds in a 365-day year, the exclusive upper bound of generated
/// durations.
pub const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Generate a non-negative duration shorter than one year, with whole
/// seconds only.
pub fn generate_duration(source: &mut dyn RandomSource) -> Duration {
    let mut duration = Duration::new();
    duration.seconds = source.below(SECONDS_PER_YEAR as u64) as i64;
    duration.nanos = 0;
    duration
}
