//! Discriminated union resolution.

use crate::source::RandomSource;

/// Outcome of resolving a oneof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneofChoice {
    /// No variant is set
    Unset,
    /// Index of the chosen variant, in declaration order
    Variant(usize),
}

/// Pick one of `variants` uniformly, with one extra slot for "unset" when
/// `allow_unset` is true.
///
/// With no variants and absence disallowed the result is `Unset`.
pub fn resolve_oneof(
    source: &mut dyn RandomSource,
    variants: usize,
    allow_unset: bool,
) -> OneofChoice {
    let slots = variants as u64 + u64::from(allow_unset);
    if slots == 0 {
        return OneofChoice::Unset;
    }
    match source.below(slots) as usize {
        index if index < variants => OneofChoice::Variant(index),
        _ => OneofChoice::Unset,
    }
}
