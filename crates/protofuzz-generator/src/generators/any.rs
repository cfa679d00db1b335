//! `Any` generator.

use crate::codec::encode_sorted;
use crate::compose::Generation;
use crate::error::Result;
use protobuf::reflect::MessageDescriptor;
use protobuf::well_known_types::any::Any;
use protobuf::well_known_types::duration::Duration;
use protobuf::well_known_types::empty::Empty;
use protobuf::well_known_types::field_mask::FieldMask;
use protobuf::well_known_types::struct_::Struct;
use protobuf::well_known_types::timestamp::Timestamp;
use protobuf::{Message, MessageFull};
use protofuzz_core::AnyPayload;

/// Descriptor of the message type packed for `payload`.
pub fn payload_descriptor(payload: AnyPayload) -> MessageDescriptor {
    match payload {
        AnyPayload::Struct => Struct::descriptor(),
        AnyPayload::Duration => Duration::descriptor(),
        AnyPayload::Timestamp => Timestamp::descriptor(),
        AnyPayload::FieldMask => FieldMask::descriptor(),
        AnyPayload::Empty => Empty::descriptor(),
    }
}

const TYPE_URL_PREFIX: &str = "type.googleapis.com";

/// Generate a payload of the configured type through the registry and pack
/// it with its type URL. The payload bytes list map entries in key order.
pub fn generate_any(generation: &mut Generation<'_>) -> Result<Any> {
    let descriptor = payload_descriptor(generation.config().any_payload);
    let mut payload = descriptor.new_instance();
    generation.fill(&mut *payload)?;

    let mut any = Any::new();
    any.type_url = format!("{TYPE_URL_PREFIX}/{}", descriptor.full_name());
    any.value = encode_sorted(&*payload)?;
    Ok(any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::source::{Limits, RngSource};
    use protofuzz_core::{GeneratorConfig, MessagePlans};

    fn generate(config: &GeneratorConfig) -> Any {
        generate_seeded(config, 42)
    }

    fn generate_seeded(config: &GeneratorConfig, seed: u64) -> Any {
        let registry = Registry::well_known();
        let plans = MessagePlans::default();
        let mut source = RngSource::seeded(seed, Limits::from(config));
        let mut generation = Generation::new(&mut source, &registry, &plans, config);
        generate_any(&mut generation).unwrap()
    }

    #[test]
    fn test_default_payload_is_struct() {
        let any = generate(&GeneratorConfig::default());
        assert_eq!(any.type_url, "type.googleapis.com/google.protobuf.Struct");
        assert!(any.unpack::<Struct>().unwrap().is_some());
    }

    #[test]
    fn test_configured_payloads_unpack() {
        for payload in [
            AnyPayload::Duration,
            AnyPayload::Timestamp,
            AnyPayload::FieldMask,
            AnyPayload::Empty,
        ] {
            let config = GeneratorConfig {
                any_payload: payload,
                ..GeneratorConfig::default()
            };
            let any = generate(&config);
            let descriptor = payload_descriptor(payload);
            assert!(any.type_url.ends_with(descriptor.full_name()));
            assert!(any.unpack_dyn(&descriptor).unwrap().is_some());
        }
    }

    #[test]
    fn test_same_seed_same_payload_bytes() {
        let config = GeneratorConfig::default();
        let mut multi_entry = 0;
        for seed in 0..20 {
            let a = generate_seeded(&config, seed);
            let b = generate_seeded(&config, seed);
            assert_eq!(a.value, b.value, "seed {seed}");
            if a.unpack::<Struct>().unwrap().unwrap().fields.len() > 1 {
                multi_entry += 1;
            }
        }
        assert!(multi_entry > 0);
    }
}
