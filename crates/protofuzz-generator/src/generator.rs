//! Message generator bound to one root message type.

use crate::compose::Generation;
use crate::error::{GenerationError, Result};
use crate::registry::Registry;
use crate::source::{ByteSource, Limits, RandomSource, RngSource};
use protobuf::reflect::MessageDescriptor;
use protobuf::{MessageDyn, MessageFull};
use protofuzz_core::{GeneratorConfig, MessagePlans, ProtoSchema};

/// Produces randomized instances of one message type.
///
/// Plans for every reachable message type are built once at construction;
/// the generator is immutable afterwards and can be shared across threads.
#[derive(Debug, Clone)]
pub struct MessageGenerator {
    descriptor: MessageDescriptor,
    registry: Registry,
    plans: MessagePlans,
    config: GeneratorConfig,
}

impl MessageGenerator {
    /// Create a generator using the well-known type generators.
    pub fn new(descriptor: MessageDescriptor, config: GeneratorConfig) -> Result<Self> {
        Self::with_registry(descriptor, config, Registry::well_known())
    }

    /// Create a generator for a generated message type.
    pub fn for_message<M: MessageFull>(config: GeneratorConfig) -> Result<Self> {
        Self::new(M::descriptor(), config)
    }

    /// Create a generator for the message `name` of a loaded schema.
    pub fn from_schema(schema: &ProtoSchema, name: &str, config: GeneratorConfig) -> Result<Self> {
        let descriptor = schema
            .get_message(name)
            .map_err(|e| GenerationError::MessageTypeNotFound(e.to_string()))?;
        Self::new(descriptor, config)
    }

    /// Create a generator with a custom registry.
    pub fn with_registry(
        descriptor: MessageDescriptor,
        config: GeneratorConfig,
        registry: Registry,
    ) -> Result<Self> {
        config.validate()?;
        let plans = MessagePlans::reachable_from(&descriptor, |m| registry.contains(m.full_name()));
        tracing::debug!(
            message = descriptor.full_name(),
            plans = plans.len(),
            specialized = registry.len(),
            "Created message generator"
        );
        Ok(Self {
            descriptor,
            registry,
            plans,
            config,
        })
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Source limits derived from the config.
    pub fn limits(&self) -> Limits {
        Limits::from(&self.config)
    }

    /// Generate a fresh instance from `source`.
    pub fn generate(&self, source: &mut dyn RandomSource) -> Result<Box<dyn MessageDyn>> {
        let mut message = self.descriptor.new_instance();
        self.fill(&mut *message, source)?;
        Ok(message)
    }

    /// Regenerate `message` in place. Its type must match the generator's.
    pub fn generate_into(
        &self,
        message: &mut dyn MessageDyn,
        source: &mut dyn RandomSource,
    ) -> Result<()> {
        let actual = message.descriptor_dyn();
        if actual.full_name() != self.descriptor.full_name() {
            return Err(GenerationError::TypeMismatch {
                expected: self.descriptor.full_name().to_string(),
                actual: actual.full_name().to_string(),
            });
        }
        self.fill(message, source)
    }

    /// Generate an instance of the generated type `M`.
    pub fn generate_message<M: MessageFull>(&self, source: &mut dyn RandomSource) -> Result<M> {
        let mut message = M::new();
        self.generate_into(&mut message, source)?;
        Ok(message)
    }

    /// Generate from a PRNG seeded with `seed`.
    pub fn generate_seeded(&self, seed: u64) -> Result<Box<dyn MessageDyn>> {
        let mut source = RngSource::seeded(seed, self.limits());
        self.generate(&mut source)
    }

    /// Generate from raw bytes, e.g. a fuzzer input.
    pub fn generate_from_bytes(&self, data: &[u8]) -> Result<Box<dyn MessageDyn>> {
        let mut source = ByteSource::new(data, self.limits());
        self.generate(&mut source)
    }

    /// Lazily generate `count` instances, each from its own seed derived from
    /// `seed` and the instance index.
    pub fn instances(&self, seed: u64, count: u64) -> MessageIterator<'_> {
        MessageIterator {
            generator: self,
            seed,
            index: 0,
            count,
        }
    }

    fn fill(&self, message: &mut dyn MessageDyn, source: &mut dyn RandomSource) -> Result<()> {
        let mut generation = Generation::new(source, &self.registry, &self.plans, &self.config);
        generation.fill(message)?;
        tracing::debug!(message = self.descriptor.full_name(), "Generated message");
        Ok(())
    }
}

/// Seed for instance `index` of a run seeded with `seed`.
pub fn seed_for_index(seed: u64, index: u64) -> u64 {
    seed.wrapping_add(index.wrapping_mul(0x9E3779B97F4A7C15))
}

/// Iterator over seeded instances.
pub struct MessageIterator<'a> {
    generator: &'a MessageGenerator,
    seed: u64,
    index: u64,
    count: u64,
}

impl Iterator for MessageIterator<'_> {
    type Item = Result<Box<dyn MessageDyn>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let seed = seed_for_index(self.seed, self.index);
        self.index += 1;
        Some(self.generator.generate_seeded(seed))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MessageIterator<'_> {}
