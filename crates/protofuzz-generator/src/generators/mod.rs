//! Value generators for the well-known types and primitive fields.
//!
//! Each submodule draws from a [`RandomSource`](crate::source::RandomSource)
//! and returns a value that already satisfies the semantic constraints of its
//! type, so it survives a serialization round trip and strict validation.

pub mod any;
pub mod duration;
pub mod field_mask;
pub mod oneof;
pub mod scalar;
pub mod timestamp;
pub mod value;

pub use any::{generate_any, payload_descriptor};
pub use duration::{generate_duration, SECONDS_PER_YEAR};
pub use field_mask::{
    generate_field_mask, generate_field_path, generate_segment, is_valid_field_path,
    FALLBACK_SEGMENT,
};
pub use oneof::{resolve_oneof, OneofChoice};
pub use scalar::{generate_enum, generate_scalar};
pub use timestamp::generate_timestamp;
pub use value::{generate_struct, generate_value};
