//! Scalar and enum value generators.

use crate::source::RandomSource;
use protobuf::reflect::{EnumDescriptor, ReflectValueBox};
use protofuzz_core::ScalarKind;

/// Generate a value of a primitive kind.
///
/// Floats are drawn from `[0, 1)`.
pub fn generate_scalar(source: &mut dyn RandomSource, kind: ScalarKind) -> ReflectValueBox {
    match kind {
        ScalarKind::I32 => ReflectValueBox::I32(source.next_u32() as i32),
        ScalarKind::I64 => ReflectValueBox::I64(source.next_u64() as i64),
        ScalarKind::U32 => ReflectValueBox::U32(source.next_u32()),
        ScalarKind::U64 => ReflectValueBox::U64(source.next_u64()),
        ScalarKind::F32 => ReflectValueBox::F32(source.unit_f64() as f32),
        ScalarKind::F64 => ReflectValueBox::F64(source.unit_f64()),
        ScalarKind::Bool => ReflectValueBox::Bool(source.boolean()),
        ScalarKind::String => ReflectValueBox::String(source.string()),
        ScalarKind::Bytes => ReflectValueBox::Bytes(source.bytes()),
    }
}

/// Draw uniformly from the declared values of an enum.
pub fn generate_enum(source: &mut dyn RandomSource, descriptor: &EnumDescriptor) -> ReflectValueBox {
    let values: Vec<_> = descriptor.values().collect();
    let number = if values.is_empty() {
        0
    } else {
        values[source.below(values.len() as u64) as usize].value()
    };
    ReflectValueBox::Enum(descriptor.clone(), number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Limits, RngSource};
    use protobuf::well_known_types::struct_::NullValue;
    use protobuf::EnumFull;

    #[test]
    fn test_scalar_kinds_match() {
        let mut source = RngSource::seeded(42, Limits::default());
        assert!(matches!(
            generate_scalar(&mut source, ScalarKind::I32),
            ReflectValueBox::I32(_)
        ));
        assert!(matches!(
            generate_scalar(&mut source, ScalarKind::Bytes),
            ReflectValueBox::Bytes(_)
        ));
        for _ in 0..100 {
            if let ReflectValueBox::F64(f) = generate_scalar(&mut source, ScalarKind::F64) {
                assert!((0.0..1.0).contains(&f));
            } else {
                panic!("Expected F64");
            }
        }
    }

    #[test]
    fn test_enum_uses_declared_values() {
        let descriptor = NullValue::enum_descriptor();
        let mut source = RngSource::seeded(42, Limits::default());
        for _ in 0..20 {
            match generate_enum(&mut source, &descriptor) {
                ReflectValueBox::Enum(d, number) => {
                    assert_eq!(d, descriptor);
                    assert!(descriptor.value_by_number(number).is_some());
                }
                other => panic!("Expected enum, got {other:?}"),
            }
        }
    }
}
