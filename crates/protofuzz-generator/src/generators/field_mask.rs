//! Field mask and path segment generators.

use crate::error::{GenerationError, Result};
use crate::source::{RandomSource, LOWERCASE};
use protobuf::well_known_types::field_mask::FieldMask;

/// Segment used once the source is exhausted and can only produce empty
/// strings.
pub const FALLBACK_SEGMENT: &str = "a";

/// Most segments in a generated path.
pub const MAX_PATH_SEGMENTS: usize = 2;

/// Generate a field mask with a sequence-length number of paths.
pub fn generate_field_mask(
    source: &mut dyn RandomSource,
    max_attempts: usize,
) -> Result<FieldMask> {
    let count = source.seq_len();
    let mut mask = FieldMask::new();
    for _ in 0..count {
        mask.paths.push(generate_field_path(source, max_attempts)?);
    }
    Ok(mask)
}

/// Generate a path of one or two segments joined by `_`.
pub fn generate_field_path(source: &mut dyn RandomSource, max_attempts: usize) -> Result<String> {
    let segments = 1 + source.below(MAX_PATH_SEGMENTS as u64) as usize;
    let mut words = Vec::with_capacity(segments);
    for _ in 0..segments {
        words.push(generate_segment(source, max_attempts)?);
    }
    Ok(words.join("_"))
}

/// Draw a non-empty `[a-z]+` segment, redrawing empty ones at most
/// `max_attempts` times.
pub fn generate_segment(source: &mut dyn RandomSource, max_attempts: usize) -> Result<String> {
    for _ in 0..max_attempts {
        let segment = source.string_from(LOWERCASE);
        if !segment.is_empty() {
            return Ok(segment);
        }
        if source.is_exhausted() {
            tracing::warn!(
                fallback = FALLBACK_SEGMENT,
                "Randomness exhausted while drawing a field path segment"
            );
            return Ok(FALLBACK_SEGMENT.to_string());
        }
    }
    Err(GenerationError::SegmentRetriesExhausted {
        attempts: max_attempts,
    })
}

/// Whether `path` has the shape the generator produces: one or two
/// non-empty lowercase segments separated by single underscores.
pub fn is_valid_field_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('_').collect();
    (1..=MAX_PATH_SEGMENTS).contains(&segments.len())
        && segments
            .iter()
            .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ByteSource, Limits, RngSource};

    #[test]
    fn test_generated_paths_are_valid() {
        let mut source = RngSource::seeded(42, Limits::default());
        for _ in 0..200 {
            let mask = generate_field_mask(&mut source, 64).unwrap();
            assert!(mask.paths.len() <= 10);
            for path in &mask.paths {
                assert!(is_valid_field_path(path), "invalid path {path:?}");
            }
        }
    }

    #[test]
    fn test_path_segment_count() {
        let mut source = RngSource::seeded(42, Limits::default());
        let mut counts = [0usize; 3];
        for _ in 0..200 {
            let path = generate_field_path(&mut source, 64).unwrap();
            counts[path.split('_').count()] += 1;
        }
        assert_eq!(counts[0], 0);
        assert!(counts[1] > 0);
        assert!(counts[2] > 0);
    }

    #[test]
    fn test_path_validity_rules() {
        assert!(is_valid_field_path("abc"));
        assert!(is_valid_field_path("ab_c"));
        assert!(!is_valid_field_path(""));
        assert!(!is_valid_field_path("_ab"));
        assert!(!is_valid_field_path("ab_"));
        assert!(!is_valid_field_path("ab__c"));
        assert!(!is_valid_field_path("a_b_c"));
        assert!(!is_valid_field_path("aB"));
    }

    #[test]
    fn test_exhausted_source_uses_fallback() {
        let mut source = ByteSource::new(&[], Limits::default());
        assert_eq!(generate_segment(&mut source, 64).unwrap(), FALLBACK_SEGMENT);
        assert_eq!(generate_field_path(&mut source, 64).unwrap(), "a");
    }

    #[test]
    fn test_retry_bound_is_an_error() {
        let limits = Limits {
            max_string_len: 1,
            ..Limits::default()
        };
        let mut source = RngSource::seeded(42, limits);
        let err = generate_segment(&mut source, 5).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::SegmentRetriesExhausted { attempts: 5 }
        ));
    }
}
