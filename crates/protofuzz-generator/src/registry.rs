//! Registry of specialized message generators.
//!
//! A [`Registry`] maps a message full name to a generator that replaces
//! field-by-field composition for that type. The well-known types form one
//! such registry; callers can merge their own on top.

use crate::compose::Generation;
use crate::error::{GenerationError, Result};
use crate::generators::any::generate_any;
use crate::generators::duration::generate_duration;
use crate::generators::field_mask::generate_field_mask;
use crate::generators::timestamp::generate_timestamp;
use crate::generators::value::{generate_struct, generate_value};
use protobuf::well_known_types::struct_::ListValue;
use protobuf::{MessageDyn, MessageFull};
use protofuzz_core::WellKnownType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A specialized generator: populates the given message in place.
pub type GeneratorFn = dyn Fn(&mut dyn MessageDyn, &mut Generation<'_>) -> Result<()> + Send + Sync;

/// Mapping from message full name to specialized generator.
#[derive(Clone, Default)]
pub struct Registry {
    generators: HashMap<String, Arc<GeneratorFn>>,
}

impl Registry {
    /// An empty registry; every message is composed generically.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generators for the semantically constrained well-known types.
    pub fn well_known() -> Self {
        Self::new()
            .with(WellKnownType::Duration.full_name(), |message, generation| {
                store(message, generate_duration(generation.source()))
            })
            .with(WellKnownType::Timestamp.full_name(), |message, generation| {
                store(message, generate_timestamp(generation.source()))
            })
            .with(WellKnownType::Struct.full_name(), |message, generation| {
                let config = generation.config();
                let value = generate_struct(
                    generation.source(),
                    config.struct_max_fields,
                    config.struct_depth,
                );
                store(message, value)
            })
            .with(WellKnownType::Value.full_name(), |message, generation| {
                let config = generation.config();
                let value = generate_value(
                    generation.source(),
                    config.value_depth,
                    config.struct_max_fields,
                );
                store(message, value)
            })
            .with(WellKnownType::ListValue.full_name(), |message, generation| {
                let config = generation.config();
                let source = generation.source();
                let mut list = ListValue::new();
                for _ in 0..source.seq_len() {
                    list.values.push(generate_value(
                        source,
                        config.value_depth,
                        config.struct_max_fields,
                    ));
                }
                store(message, list)
            })
            .with(WellKnownType::FieldMask.full_name(), |message, generation| {
                let attempts = generation.config().max_segment_attempts;
                store(message, generate_field_mask(generation.source(), attempts)?)
            })
            .with(WellKnownType::Any.full_name(), |message, generation| {
                let any = generate_any(generation)?;
                store(message, any)
            })
    }

    /// Register a generator, replacing any previous one for the same type.
    pub fn register<F>(&mut self, full_name: impl Into<String>, generator: F)
    where
        F: Fn(&mut dyn MessageDyn, &mut Generation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.generators.insert(full_name.into(), Arc::new(generator));
    }

    /// Builder form of [`Registry::register`].
    pub fn with<F>(mut self, full_name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&mut dyn MessageDyn, &mut Generation<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.register(full_name, generator);
        self
    }

    /// Merge `other` into this registry. Entries of `other` win.
    pub fn merge(mut self, other: Registry) -> Self {
        self.generators.extend(other.generators);
        self
    }

    pub fn get(&self, full_name: &str) -> Option<&Arc<GeneratorFn>> {
        self.generators.get(full_name)
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.generators.contains_key(full_name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("generators", &self.names())
            .finish()
    }
}

/// Write a generated value into `target`.
///
/// Generated targets are assigned directly; dynamic instances of the same
/// type are cleared and filled from the encoded value.
pub fn store<M: MessageFull>(target: &mut dyn MessageDyn, value: M) -> Result<()> {
    if let Some(slot) = target.downcast_mut::<M>() {
        *slot = value;
        return Ok(());
    }

    let descriptor = target.descriptor_dyn();
    if descriptor.full_name() != M::descriptor().full_name() {
        return Err(GenerationError::TypeMismatch {
            expected: M::descriptor().full_name().to_string(),
            actual: descriptor.full_name().to_string(),
        });
    }
    for field in descriptor.fields() {
        field.clear_field(target);
    }
    let bytes = value.write_to_bytes()?;
    target.merge_from_bytes_dyn(&bytes)?;
    Ok(())
}
