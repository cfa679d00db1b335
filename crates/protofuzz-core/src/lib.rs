//! Core types for protofuzz.
//!
//! This crate provides the descriptor-side foundation shared by the
//! generator and the CLI:
//!
//! - [`ProtoSchema`] - `.proto` sources parsed and linked at runtime
//! - [`MessagePlan`] - Ordered field bindings of a message type
//! - [`WellKnownType`] - The `google.protobuf` types with semantic constraints
//! - [`GeneratorConfig`] - Generation knobs loaded from YAML
//!
//! # Architecture
//!
//! ```text
//! protofuzz-core (this crate)
//!    │
//!    ├─── protofuzz-generator  (composer, well-known generators, validation)
//!    │
//!    └─── protofuzz            (CLI)
//! ```
//!
//! # Example
//!
//! ```rust
//! use protofuzz_core::{MessagePlan, ProtoSchema};
//!
//! let schema = ProtoSchema::from_string(r#"
//!     syntax = "proto3";
//!     package demo;
//!     message Point { int32 x = 1; int32 y = 2; }
//! "#).unwrap();
//!
//! let point = schema.get_message("Point").unwrap();
//! let plan = MessagePlan::from_descriptor(&point);
//! assert_eq!(plan.fields().len(), 2);
//! ```

pub mod config;
pub mod schema;
pub mod types;

pub use config::{AnyPayload, ConfigError, GeneratorConfig};
pub use schema::{builtin_file_descriptors, include_dir, ProtoSchema, SchemaError};
pub use types::{
    FieldPlan, MessagePlan, MessagePlans, OneofVariant, ScalarKind, ValueKind, WellKnownType,
};
