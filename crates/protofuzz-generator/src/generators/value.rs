//! Dynamic `Value` and `Struct` generators.

use super::oneof::{resolve_oneof, OneofChoice};
use crate::source::RandomSource;
use protobuf::well_known_types::struct_::{value::Kind, NullValue, Struct, Value};
use protobuf::EnumOrUnknown;

/// Branches of a `Value`, in draw order.
const VALUE_BRANCHES: usize = 5;

/// Generate a `Value` holding one of null, string, bool, number or struct.
///
/// `depth` is the struct nesting still allowed; at 0 the struct branch is
/// excluded.
pub fn generate_value(source: &mut dyn RandomSource, depth: usize, max_fields: usize) -> Value {
    let branches = if depth == 0 {
        VALUE_BRANCHES - 1
    } else {
        VALUE_BRANCHES
    };

    let kind = match resolve_oneof(source, branches, false) {
        OneofChoice::Variant(0) | OneofChoice::Unset => {
            Kind::NullValue(EnumOrUnknown::new(NullValue::NULL_VALUE))
        }
        OneofChoice::Variant(1) => Kind::StringValue(source.string()),
        OneofChoice::Variant(2) => Kind::BoolValue(source.boolean()),
        OneofChoice::Variant(3) => Kind::NumberValue(source.normal_f64()),
        OneofChoice::Variant(_) => {
            Kind::StructValue(generate_struct(source, max_fields, depth - 1))
        }
    };

    let mut value = Value::new();
    value.kind = Some(kind);
    value
}

/// Generate a `Struct` with up to `max_fields` entries.
///
/// Each iteration draws the key before the value. With `depth` 0 values are
/// flat (number, bool or string); otherwise they are full `Value`s allowed
/// `depth` further levels of struct nesting. A repeated key overwrites the
/// earlier entry.
pub fn generate_struct(source: &mut dyn RandomSource, max_fields: usize, depth: usize) -> Struct {
    let count = source.below((max_fields as u64).saturating_add(1));
    let mut result = Struct::new();
    for _ in 0..count {
        let key = source.string();
        let value = if depth == 0 {
            flat_value(source)
        } else {
            generate_value(source, depth, max_fields)
        };
        result.fields.insert(key, value);
    }
    result
}

fn flat_value(source: &mut dyn RandomSource) -> Value {
    let kind = match resolve_oneof(source, 3, false) {
        OneofChoice::Variant(0) | OneofChoice::Unset => Kind::NumberValue(source.unit_f64()),
        OneofChoice::Variant(1) => Kind::BoolValue(source.boolean()),
        OneofChoice::Variant(_) => Kind::StringValue(source.string()),
    };
    let mut value = Value::new();
    value.kind = Some(kind);
    value
}
