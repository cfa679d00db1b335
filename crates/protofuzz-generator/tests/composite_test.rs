//! Generation of the composite `test.v1.All` message and its parts.

use protobuf::reflect::{
    MessageDescriptor, ReflectEqMode, ReflectValueBox, ReflectValueRef,
};
use protobuf::well_known_types::any::Any;
use protobuf::well_known_types::struct_::Struct;
use protobuf::MessageDyn;
use protofuzz_core::{GeneratorConfig, ProtoSchema};
use protofuzz_generator::validate::check_any;
use protofuzz_generator::{
    encode_sorted, validate_message, MessageGenerator, Registry, RngSource,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

const TEST_PROTO: &str = include_str!("../../../protos/test/v1/test.proto");

fn schema() -> ProtoSchema {
    ProtoSchema::from_string(TEST_PROTO).expect("Failed to parse test.proto")
}

fn message(name: &str) -> MessageDescriptor {
    schema().get_message(name).unwrap()
}

fn generator(name: &str) -> MessageGenerator {
    MessageGenerator::new(message(name), GeneratorConfig::default()).unwrap()
}

fn with_sub_message<R>(
    message: &dyn MessageDyn,
    field: &str,
    f: impl FnOnce(&dyn MessageDyn) -> R,
) -> Option<R> {
    let descriptor = message.descriptor_dyn();
    match descriptor.field_by_name(field)?.get_singular(message)? {
        ReflectValueRef::Message(m) => Some(f(&*m)),
        _ => None,
    }
}

#[test]
fn test_all_round_trips_and_validates() {
    let generator = generator("test.v1.All");
    let descriptor = generator.descriptor().clone();

    for seed in 0..200 {
        let message = generator.generate_seeded(seed).unwrap();
        validate_message(&*message).unwrap();

        let bytes = message.write_to_bytes_dyn().unwrap();
        let parsed = descriptor.parse_from_bytes(&bytes).unwrap();
        validate_message(&*parsed).unwrap();
        assert!(
            message.reflect_eq_dyn(&*parsed, &ReflectEqMode::default()),
            "seed {seed} did not survive a round trip"
        );
    }
}

#[test]
fn test_same_seed_same_message() {
    let generator = generator("test.v1.All");
    for seed in [0, 1, 42, u64::MAX] {
        let a = generator.generate_seeded(seed).unwrap();
        let b = generator.generate_seeded(seed).unwrap();
        assert!(a.reflect_eq_dyn(&*b, &ReflectEqMode::default()));
    }

    let a = generator.generate_seeded(1).unwrap();
    let b = generator.generate_seeded(2).unwrap();
    assert!(!a.reflect_eq_dyn(&*b, &ReflectEqMode::default()));
}

#[test]
fn test_same_bytes_same_encoding() {
    let generator = generator("test.v1.All");
    let mut rng = StdRng::seed_from_u64(7);
    let mut compared_any = 0;

    for _ in 0..50 {
        let data: Vec<u8> = (0..2048).map(|_| rng.gen()).collect();
        let a = generator.generate_from_bytes(&data).unwrap();
        let b = generator.generate_from_bytes(&data).unwrap();
        assert!(a.reflect_eq_dyn(&*b, &ReflectEqMode::default()));
        assert_eq!(encode_sorted(&*a).unwrap(), encode_sorted(&*b).unwrap());

        let any_value = |m: &dyn MessageDyn| {
            with_sub_message(m, "w", |w| {
                with_sub_message(w, "a", |a| a.downcast_ref::<Any>().unwrap().value.clone())
            })
            .flatten()
        };
        if let Some(value) = any_value(&*a) {
            assert_eq!(Some(value), any_value(&*b));
            compared_any += 1;
        }
    }
    assert!(compared_any > 0);
}

#[test]
fn test_same_seed_same_encoding() {
    let generator = generator("test.v1.All");
    for seed in 0..50 {
        let a = encode_sorted(&*generator.generate_seeded(seed).unwrap()).unwrap();
        let b = encode_sorted(&*generator.generate_seeded(seed).unwrap()).unwrap();
        assert_eq!(a, b, "seed {seed}");

        let parsed = generator.descriptor().parse_from_bytes(&a).unwrap();
        validate_message(&*parsed).unwrap();
        assert_eq!(encode_sorted(&*parsed).unwrap(), a);
    }
}

#[test]
fn test_oneof_exclusive_and_every_variant_reachable() {
    let generator = generator("test.v1.OneOf");
    let descriptor = generator.descriptor().clone();
    let mut outcomes = HashSet::new();

    for seed in 0..500 {
        let message = generator.generate_seeded(seed).unwrap();
        let set: Vec<String> = descriptor
            .fields()
            .filter(|f| f.has_field(&*message))
            .map(|f| f.name().to_string())
            .collect();
        assert!(set.len() <= 1, "seed {seed} set {set:?}");
        outcomes.insert(set.first().cloned().unwrap_or_default());
    }

    // 17 variants plus unset
    assert_eq!(outcomes.len(), 18, "observed {outcomes:?}");
}

#[test]
fn test_regeneration_replaces_oneof() {
    let generator = generator("test.v1.OneOfWKT");
    let descriptor = generator.descriptor().clone();
    let mut message = descriptor.new_instance();
    let mut source = RngSource::seeded(42, generator.limits());

    for _ in 0..100 {
        generator.generate_into(&mut *message, &mut source).unwrap();
        let set = descriptor.fields().filter(|f| f.has_field(&*message)).count();
        assert!(set <= 1);
        validate_message(&*message).unwrap();
    }
}

#[test]
fn test_any_unpacks_by_type_url() {
    let generator = generator("test.v1.WKTs");
    let mut checked = 0;
    for seed in 0..100 {
        let message = generator.generate_seeded(seed).unwrap();
        let unpacked = with_sub_message(&*message, "a", |a| {
            let any = a
                .downcast_ref::<Any>()
                .expect("well-known fields use generated types");
            assert_eq!(any.type_url, "type.googleapis.com/google.protobuf.Struct");
            assert!(any.unpack::<Struct>().unwrap().is_some());
            check_any(any).unwrap();
        });
        if unpacked.is_some() {
            checked += 1;
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_all_zero_bytes() {
    let generator = generator("test.v1.WKTs");
    let zeros = vec![0u8; 1024];
    let message = generator.generate_from_bytes(&zeros).unwrap();
    validate_message(&*message).unwrap();

    let fields = with_sub_message(&*message, "st", |st| {
        st.downcast_ref::<Struct>().unwrap().fields.len()
    });
    assert_eq!(fields, Some(0));
}

#[test]
fn test_arbitrary_bytes_never_break_invariants() {
    let generator = generator("test.v1.All");
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let len = rng.gen_range(0..4096);
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let message = generator.generate_from_bytes(&data).unwrap();
        validate_message(&*message).unwrap();
        let bytes = message.write_to_bytes_dyn().unwrap();
        generator.descriptor().parse_from_bytes(&bytes).unwrap();
    }

    let empty = generator.generate_from_bytes(&[]).unwrap();
    validate_message(&*empty).unwrap();
}

#[test]
fn test_custom_registry_entry_overrides_composition() {
    let schema = schema();
    let inner = schema.get_message("test.v1.Message").unwrap();
    let id = inner.field_by_name("id").unwrap();
    let custom = Registry::new().with("test.v1.Message", move |message, _| {
        id.set_singular_field(message, ReflectValueBox::String("fixed".to_string()));
        Ok(())
    });
    let registry = Registry::well_known().merge(custom);
    let repeated = schema.get_message("test.v1.Repeated").unwrap();
    let generator =
        MessageGenerator::with_registry(repeated, GeneratorConfig::default(), registry).unwrap();

    let msg = generator.descriptor().field_by_name("msg").unwrap();
    let mut seen = 0;
    for seed in 0..20 {
        let message = generator.generate_seeded(seed).unwrap();
        let repeated = msg.get_repeated(&*message);
        for i in 0..repeated.len() {
            if let ReflectValueRef::Message(m) = repeated.get(i) {
                let id = m.descriptor_dyn().field_by_name("id").unwrap();
                assert_eq!(
                    id.get_singular_field_or_default(&*m).to_str(),
                    Some("fixed")
                );
                seen += 1;
            }
        }
    }
    assert!(seen > 0);
}

#[test]
fn test_configured_bounds_respected() {
    let config = GeneratorConfig {
        min_elements: 2,
        max_elements: 3,
        ..GeneratorConfig::default()
    };
    let generator = MessageGenerator::new(message("test.v1.Repeated"), config).unwrap();
    let s = generator.descriptor().field_by_name("s").unwrap();
    for seed in 0..50 {
        let message = generator.generate_seeded(seed).unwrap();
        let len = s.get_repeated(&*message).len();
        assert!((2..=3).contains(&len));
    }
}
