//! Deterministic protobuf encoding.
//!
//! The runtime serializer writes map entries in hash order, so two equal
//! messages can encode to different bytes. [`encode_sorted`] walks the
//! message through reflection and writes map entries ordered by key, which
//! makes the bytes a function of the message alone. Repeated scalars are
//! written unpacked.

use crate::error::{GenerationError, Result};
use protobuf::descriptor::field_descriptor_proto::Type;
use protobuf::reflect::{
    FieldDescriptor, MessageDescriptor, ReflectValueRef, RuntimeFieldType, Syntax,
};
use protobuf::{CodedOutputStream, MessageDyn};
use std::cmp::Ordering;

/// Encode `message` to protobuf binary format with map entries sorted by
/// key, recursing into nested messages.
pub fn encode_sorted(message: &dyn MessageDyn) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut stream = CodedOutputStream::vec(&mut buffer);
        write_message(&mut stream, message)?;
        stream.flush()?;
    }
    Ok(buffer)
}

/// Whether `value` is the default of its type. Proto3 never puts such a
/// value on the wire unless the field tracks presence.
pub fn is_default(value: &ReflectValueRef) -> bool {
    match value {
        ReflectValueRef::U32(v) => *v == 0,
        ReflectValueRef::U64(v) => *v == 0,
        ReflectValueRef::I32(v) => *v == 0,
        ReflectValueRef::I64(v) => *v == 0,
        ReflectValueRef::F32(v) => *v == 0.0,
        ReflectValueRef::F64(v) => *v == 0.0,
        ReflectValueRef::Bool(v) => !*v,
        ReflectValueRef::String(v) => v.is_empty(),
        ReflectValueRef::Bytes(v) => v.is_empty(),
        ReflectValueRef::Enum(_, number) => *number == 0,
        ReflectValueRef::Message(_) => false,
    }
}

fn write_message(stream: &mut CodedOutputStream, message: &dyn MessageDyn) -> Result<()> {
    let descriptor = message.descriptor_dyn();
    let proto3 = descriptor.file_descriptor().syntax() == Syntax::Proto3;

    for field in descriptor.fields() {
        let number = field.number() as u32;
        let field_type = field.proto().type_();
        match field.runtime_field_type() {
            RuntimeFieldType::Singular(_) => {
                if let Some(value) = field.get_singular(message) {
                    let tracked =
                        !proto3 || field.containing_oneof_including_synthetic().is_some();
                    if tracked || !is_default(&value) {
                        write_value(stream, &field, number, field_type, &value)?;
                    }
                }
            }
            RuntimeFieldType::Repeated(_) => {
                let repeated = field.get_repeated(message);
                for i in 0..repeated.len() {
                    write_value(stream, &field, number, field_type, &repeated.get(i))?;
                }
            }
            RuntimeFieldType::Map(_, _) => {
                let entry = map_entry(&field)?;
                let (key_field, value_field) =
                    match (entry.field_by_number(1), entry.field_by_number(2)) {
                        (Some(k), Some(v)) => (k, v),
                        _ => return Err(unsupported(&field, "map entry lacks key or value")),
                    };
                let map = field.get_map(message);
                let mut entries: Vec<_> = (&map).into_iter().collect();
                entries.sort_by(|(a, _), (b, _)| key_order(a, b));

                for (key, value) in entries {
                    let mut bytes = Vec::new();
                    {
                        let mut entry_stream = CodedOutputStream::vec(&mut bytes);
                        let key_type = key_field.proto().type_();
                        let value_type = value_field.proto().type_();
                        write_value(&mut entry_stream, &key_field, 1, key_type, &key)?;
                        write_value(&mut entry_stream, &value_field, 2, value_type, &value)?;
                        entry_stream.flush()?;
                    }
                    stream.write_bytes(number, &bytes)?;
                }
            }
        }
    }

    let mut unknown: Vec<_> = message.unknown_fields_dyn().iter().collect();
    unknown.sort_by_key(|(number, _)| *number);
    for (number, value) in unknown {
        stream.write_unknown(number, value)?;
    }
    Ok(())
}

fn write_value(
    stream: &mut CodedOutputStream,
    field: &FieldDescriptor,
    number: u32,
    field_type: Type,
    value: &ReflectValueRef,
) -> Result<()> {
    match (field_type, value) {
        (Type::TYPE_DOUBLE, ReflectValueRef::F64(v)) => stream.write_double(number, *v)?,
        (Type::TYPE_FLOAT, ReflectValueRef::F32(v)) => stream.write_float(number, *v)?,
        (Type::TYPE_INT64, ReflectValueRef::I64(v)) => stream.write_int64(number, *v)?,
        (Type::TYPE_UINT64, ReflectValueRef::U64(v)) => stream.write_uint64(number, *v)?,
        (Type::TYPE_INT32, ReflectValueRef::I32(v)) => stream.write_int32(number, *v)?,
        (Type::TYPE_FIXED64, ReflectValueRef::U64(v)) => stream.write_fixed64(number, *v)?,
        (Type::TYPE_FIXED32, ReflectValueRef::U32(v)) => stream.write_fixed32(number, *v)?,
        (Type::TYPE_BOOL, ReflectValueRef::Bool(v)) => stream.write_bool(number, *v)?,
        (Type::TYPE_STRING, ReflectValueRef::String(v)) => stream.write_string(number, v)?,
        (Type::TYPE_BYTES, ReflectValueRef::Bytes(v)) => stream.write_bytes(number, v)?,
        (Type::TYPE_UINT32, ReflectValueRef::U32(v)) => stream.write_uint32(number, *v)?,
        (Type::TYPE_ENUM, ReflectValueRef::Enum(_, v)) => stream.write_enum(number, *v)?,
        (Type::TYPE_SFIXED32, ReflectValueRef::I32(v)) => stream.write_sfixed32(number, *v)?,
        (Type::TYPE_SFIXED64, ReflectValueRef::I64(v)) => stream.write_sfixed64(number, *v)?,
        (Type::TYPE_SINT32, ReflectValueRef::I32(v)) => stream.write_sint32(number, *v)?,
        (Type::TYPE_SINT64, ReflectValueRef::I64(v)) => stream.write_sint64(number, *v)?,
        (Type::TYPE_MESSAGE, ReflectValueRef::Message(m)) => {
            let bytes = encode_sorted(&**m)?;
            stream.write_bytes(number, &bytes)?;
        }
        (Type::TYPE_GROUP, _) => return Err(unsupported(field, "groups are not supported")),
        _ => return Err(unsupported(field, "value does not match the declared type")),
    }
    Ok(())
}

/// The synthesized entry type of a map field, nested in the map's message.
fn map_entry(field: &FieldDescriptor) -> Result<MessageDescriptor> {
    let type_name = field.proto().type_name();
    let entry_name = type_name.rsplit('.').next().unwrap_or(type_name);
    field
        .containing_message()
        .nested_messages()
        .find(|m| m.is_map_entry() && m.name() == entry_name)
        .ok_or_else(|| unsupported(field, "map entry type not found"))
}

fn key_order(a: &ReflectValueRef, b: &ReflectValueRef) -> Ordering {
    match (a, b) {
        (ReflectValueRef::I32(a), ReflectValueRef::I32(b)) => a.cmp(b),
        (ReflectValueRef::I64(a), ReflectValueRef::I64(b)) => a.cmp(b),
        (ReflectValueRef::U32(a), ReflectValueRef::U32(b)) => a.cmp(b),
        (ReflectValueRef::U64(a), ReflectValueRef::U64(b)) => a.cmp(b),
        (ReflectValueRef::Bool(a), ReflectValueRef::Bool(b)) => a.cmp(b),
        (ReflectValueRef::String(a), ReflectValueRef::String(b)) => a.cmp(b),
        // keys of one map share a type
        _ => Ordering::Equal,
    }
}

fn unsupported(field: &FieldDescriptor, reason: &str) -> GenerationError {
    GenerationError::UnsupportedField {
        field: field.full_name(),
        reason: reason.to_string(),
    }
}
