//! Generic message composition.
//!
//! [`Generation`] carries the state of one generation run: the randomness
//! source, the registry of specialized generators, the message plans and the
//! current nesting depth. [`Generation::fill`] is the entry point for every
//! message, whether the root or a nested field.

use crate::codec::is_default;
use crate::error::Result;
use crate::generators::oneof::{resolve_oneof, OneofChoice};
use crate::generators::scalar::{generate_enum, generate_scalar};
use crate::registry::Registry;
use crate::source::RandomSource;
use protobuf::reflect::ReflectValueBox;
use protobuf::MessageDyn;
use protofuzz_core::{FieldPlan, GeneratorConfig, MessagePlans, ValueKind};

/// State of a single generation run.
pub struct Generation<'a> {
    source: &'a mut dyn RandomSource,
    registry: &'a Registry,
    plans: &'a MessagePlans,
    config: &'a GeneratorConfig,
    depth: usize,
}

impl<'a> Generation<'a> {
    pub fn new(
        source: &'a mut dyn RandomSource,
        registry: &'a Registry,
        plans: &'a MessagePlans,
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            source,
            registry,
            plans,
            config,
            depth: 0,
        }
    }

    pub fn source(&mut self) -> &mut dyn RandomSource {
        &mut *self.source
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    /// Populate `message`, dispatching to a registered generator when one
    /// exists for its type and composing it field by field otherwise.
    pub fn fill(&mut self, message: &mut dyn MessageDyn) -> Result<()> {
        let descriptor = message.descriptor_dyn();
        let registry = self.registry;
        match registry.get(descriptor.full_name()) {
            Some(generator) => (generator.as_ref())(message, self),
            None => self.compose(message),
        }
    }

    /// Populate every field of `message` from its plan, in declaration
    /// order.
    pub fn compose(&mut self, message: &mut dyn MessageDyn) -> Result<()> {
        let descriptor = message.descriptor_dyn();
        let plan = self.plans.plan(&descriptor);
        let proto3 = plan.is_proto3();
        tracing::trace!(message = plan.full_name(), depth = self.depth, "Composing message");

        for binding in plan.fields() {
            match binding {
                FieldPlan::Singular {
                    field,
                    kind,
                    explicit_presence,
                } => {
                    if *explicit_presence && !self.present() {
                        field.clear_field(message);
                        continue;
                    }
                    match self.value(kind)? {
                        // proto3 drops defaults on the wire, so leave them unset
                        Some(value) if proto3 && is_default(&value.as_value_ref()) => {
                            field.clear_field(message)
                        }
                        Some(value) => field.set_singular_field(message, value),
                        None => match kind {
                            // required message at the depth limit
                            ValueKind::Message(m) if !explicit_presence => {
                                let empty = ReflectValueBox::Message(m.new_instance());
                                field.set_singular_field(message, empty)
                            }
                            _ => field.clear_field(message),
                        },
                    }
                }
                FieldPlan::Repeated { field, kind } => {
                    let count = self.source.seq_len();
                    let mut values = Vec::with_capacity(count);
                    for _ in 0..count {
                        if let Some(value) = self.value(kind)? {
                            values.push(value);
                        }
                    }
                    let mut repeated = field.mut_repeated(message);
                    repeated.clear();
                    for value in values {
                        repeated.push(value);
                    }
                }
                FieldPlan::Map { field, key, value } => {
                    let count = self.source.seq_len();
                    let mut entries = Vec::with_capacity(count);
                    for _ in 0..count {
                        let k = self.value(key)?;
                        let v = self.value(value)?;
                        if let (Some(k), Some(v)) = (k, v) {
                            entries.push((k, v));
                        }
                    }
                    let mut map = field.mut_map(message);
                    map.clear();
                    for (k, v) in entries {
                        map.insert(k, v);
                    }
                }
                FieldPlan::Oneof { variants, .. } => {
                    let chosen = match resolve_oneof(&mut *self.source, variants.len(), true) {
                        OneofChoice::Variant(index) => {
                            let variant = &variants[index];
                            self.value(&variant.kind)?
                                .filter(|value| !(proto3 && is_default(&value.as_value_ref())))
                                .map(|value| (variant, value))
                        }
                        OneofChoice::Unset => None,
                    };
                    match chosen {
                        Some((variant, value)) => variant.field.set_singular_field(message, value),
                        None => {
                            for variant in variants {
                                variant.field.clear_field(message);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn present(&mut self) -> bool {
        self.source.unit_f64() < self.config.present_chance
    }

    /// Generate one value of `kind`. Message values past `max_depth` are
    /// not generated.
    fn value(&mut self, kind: &ValueKind) -> Result<Option<ReflectValueBox>> {
        let value = match kind {
            ValueKind::Scalar(scalar) => generate_scalar(&mut *self.source, *scalar),
            ValueKind::Enum(descriptor) => generate_enum(&mut *self.source, descriptor),
            ValueKind::Message(descriptor) => {
                if self.depth >= self.config.max_depth {
                    return Ok(None);
                }
                let mut message = descriptor.new_instance();
                self.depth += 1;
                let filled = self.fill(&mut *message);
                self.depth -= 1;
                filled?;
                ReflectValueBox::Message(message)
            }
        };
        Ok(Some(value))
    }
}
