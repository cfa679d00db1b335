//! Constrained random message generation for protobuf fuzzing.
//!
//! This crate provides the [`MessageGenerator`] which produces randomized
//! instances of a protobuf message type that satisfy the semantic
//! constraints of the well-known types they contain, so that a serialization
//! round trip never fails for reasons other than a genuine bug.
//!
//! # Architecture
//!
//! ```text
//! MessageDescriptor
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │  MessageGenerator    │
//! │                      │
//! │  - MessagePlans      │
//! │  - Registry          │──── well-known generators
//! │  - GeneratorConfig   │
//! └──────────┬───────────┘
//!            │  Generation { &mut dyn RandomSource, depth }
//!            ▼
//!     Box<dyn MessageDyn>
//! ```
//!
//! # Example
//!
//! ```rust
//! use protofuzz_core::GeneratorConfig;
//! use protofuzz_generator::{validate_message, MessageGenerator};
//! use protobuf::well_known_types::struct_::Struct;
//!
//! let generator = MessageGenerator::for_message::<Struct>(GeneratorConfig::default()).unwrap();
//! let message = generator.generate_seeded(42).unwrap();
//! validate_message(&*message).unwrap();
//! ```
//!
//! # Well-known types
//!
//! - `Duration` - seconds in `[0, 31536000)`, zero nanos
//! - `Timestamp` - a valid instant within about 1000 years after the epoch
//! - `Value` - one of null, string, bool, number or struct
//! - `Struct` - up to 20 entries with flat values by default
//! - `ListValue` - a sequence of `Value`s
//! - `FieldMask` - paths of one or two `[a-z]+` segments joined by `_`
//! - `Any` - a packed `Struct` (configurable) with its type URL
//!
//! Wrappers and `Empty` are filled field by field.
//!
//! [`encode_sorted`] serializes with map entries in key order, so equal
//! messages always produce equal bytes.

pub mod codec;
pub mod compose;
pub mod error;
pub mod generator;
pub mod generators;
pub mod registry;
pub mod source;
pub mod validate;

// Re-exports for convenience
pub use codec::encode_sorted;
pub use compose::Generation;
pub use error::{GenerationError, Result};
pub use generator::{seed_for_index, MessageGenerator, MessageIterator};
pub use generators::{resolve_oneof, OneofChoice};
pub use registry::{store, GeneratorFn, Registry};
pub use source::{ByteSource, Limits, RandomSource, RngSource};
pub use validate::{validate_message, InvariantViolation};
