//! Bounded timestamp generator.

use crate::source::RandomSource;
use protobuf::well_known_types::timestamp::Timestamp;

/// Generate a timestamp from the source's calendar draw.
pub fn generate_timestamp(source: &mut dyn RandomSource) -> Timestamp {
    let dt = source.datetime();
    let mut timestamp = Timestamp::new();
    timestamp.seconds = dt.timestamp();
    timestamp.nanos = dt.timestamp_subsec_nanos() as i32;
    timestamp
}
