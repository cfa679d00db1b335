//! Post-generation validity checks.
//!
//! These checks restate the guarantees of the generators so that tests, the
//! CLI `--verify` flag and fuzz targets can detect a violation instead of
//! masking it.

use crate::generators::duration::SECONDS_PER_YEAR;
use crate::generators::field_mask::is_valid_field_path;
use protobuf::reflect::{MessageDescriptor, ReflectValueRef, RuntimeFieldType};
use protobuf::well_known_types::any::Any;
use protobuf::well_known_types::duration::Duration;
use protobuf::well_known_types::field_mask::FieldMask;
use protobuf::well_known_types::struct_::{value::Kind, ListValue, Struct, Value};
use protobuf::well_known_types::timestamp::Timestamp;
use protobuf::{MessageDyn, MessageFull};
use protofuzz_core::{builtin_file_descriptors, WellKnownType};

/// 0001-01-01T00:00:00Z
pub const MIN_TIMESTAMP_SECONDS: i64 = -62_135_596_800;

/// 9999-12-31T23:59:59Z
pub const MAX_TIMESTAMP_SECONDS: i64 = 253_402_300_799;

const NANOS_PER_SEC: i32 = 1_000_000_000;

/// A generated value that breaks the constraints of its type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Duration {seconds}s {nanos}ns is outside [0s, 31536000s) with zero nanos")]
    DurationOutOfRange { seconds: i64, nanos: i32 },

    #[error("Timestamp {seconds}s {nanos}ns is not a valid instant")]
    InvalidTimestamp { seconds: i64, nanos: i32 },

    #[error("Invalid field mask path: {0:?}")]
    InvalidFieldPath(String),

    #[error("Value has no kind set")]
    ValueKindMissing,

    #[error("Number value is not finite: {0}")]
    NonFiniteNumber(f64),

    #[error("Unknown type URL in Any: {0:?}")]
    UnknownAnyType(String),

    #[error("Failed to decode {type_name}: {reason}")]
    Decode { type_name: String, reason: String },

    #[error("Enum {enum_name} has undeclared value {number}")]
    UndeclaredEnumValue { enum_name: String, number: i32 },

    #[error("Message {0} is missing required fields")]
    Uninitialized(String),
}

pub fn check_duration(duration: &Duration) -> Result<(), InvariantViolation> {
    if !(0..SECONDS_PER_YEAR).contains(&duration.seconds) || duration.nanos != 0 {
        return Err(InvariantViolation::DurationOutOfRange {
            seconds: duration.seconds,
            nanos: duration.nanos,
        });
    }
    Ok(())
}

pub fn check_timestamp(timestamp: &Timestamp) -> Result<(), InvariantViolation> {
    let seconds_ok = (MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&timestamp.seconds);
    let nanos_ok = (0..NANOS_PER_SEC).contains(&timestamp.nanos);
    if !seconds_ok || !nanos_ok {
        return Err(InvariantViolation::InvalidTimestamp {
            seconds: timestamp.seconds,
            nanos: timestamp.nanos,
        });
    }
    Ok(())
}

pub fn check_field_mask(mask: &FieldMask) -> Result<(), InvariantViolation> {
    match mask.paths.iter().find(|p| !is_valid_field_path(p)) {
        Some(path) => Err(InvariantViolation::InvalidFieldPath(path.clone())),
        None => Ok(()),
    }
}

/// A `Value` must carry a kind, and numbers must be representable in JSON.
pub fn check_value(value: &Value) -> Result<(), InvariantViolation> {
    match &value.kind {
        None => Err(InvariantViolation::ValueKindMissing),
        Some(Kind::NumberValue(n)) if !n.is_finite() => {
            Err(InvariantViolation::NonFiniteNumber(*n))
        }
        Some(Kind::StructValue(s)) => check_struct(s),
        Some(Kind::ListValue(list)) => check_list_value(list),
        Some(_) => Ok(()),
    }
}

pub fn check_struct(value: &Struct) -> Result<(), InvariantViolation> {
    value.fields.values().try_for_each(check_value)
}

pub fn check_list_value(list: &ListValue) -> Result<(), InvariantViolation> {
    list.values.iter().try_for_each(check_value)
}

/// The type URL must name a known type and the payload must decode as that
/// type and validate in turn.
pub fn check_any(any: &Any) -> Result<(), InvariantViolation> {
    let type_name = any.type_url.rsplit('/').next().unwrap_or_default();
    let descriptor = well_known_descriptor(type_name)
        .ok_or_else(|| InvariantViolation::UnknownAnyType(any.type_url.clone()))?;

    let payload = any
        .unpack_dyn(&descriptor)
        .map_err(|e| InvariantViolation::Decode {
            type_name: type_name.to_string(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| InvariantViolation::UnknownAnyType(any.type_url.clone()))?;

    validate_message(&*payload)
}

/// Validate `message` and every message reachable through its fields.
pub fn validate_message(message: &dyn MessageDyn) -> Result<(), InvariantViolation> {
    let descriptor = message.descriptor_dyn();
    if !message.is_initialized_dyn() {
        return Err(InvariantViolation::Uninitialized(
            descriptor.full_name().to_string(),
        ));
    }

    match WellKnownType::from_full_name(descriptor.full_name()) {
        Some(WellKnownType::Duration) => check_duration(&concrete(message)?),
        Some(WellKnownType::Timestamp) => check_timestamp(&concrete(message)?),
        Some(WellKnownType::FieldMask) => check_field_mask(&concrete(message)?),
        Some(WellKnownType::Value) => check_value(&concrete(message)?),
        Some(WellKnownType::Struct) => check_struct(&concrete(message)?),
        Some(WellKnownType::ListValue) => check_list_value(&concrete(message)?),
        Some(WellKnownType::Any) => check_any(&concrete(message)?),
        _ => validate_fields(message, &descriptor),
    }
}

fn validate_fields(
    message: &dyn MessageDyn,
    descriptor: &MessageDescriptor,
) -> Result<(), InvariantViolation> {
    for field in descriptor.fields() {
        match field.runtime_field_type() {
            RuntimeFieldType::Singular(_) => {
                if let Some(value) = field.get_singular(message) {
                    validate_value(value)?;
                }
            }
            RuntimeFieldType::Repeated(_) => {
                let repeated = field.get_repeated(message);
                for i in 0..repeated.len() {
                    validate_value(repeated.get(i))?;
                }
            }
            RuntimeFieldType::Map(..) => {
                let map = field.get_map(message);
                for (_, value) in &map {
                    validate_value(value)?;
                }
            }
        }
    }
    Ok(())
}

fn validate_value(value: ReflectValueRef<'_>) -> Result<(), InvariantViolation> {
    match value {
        ReflectValueRef::Message(m) => validate_message(&*m),
        ReflectValueRef::Enum(descriptor, number) => {
            if descriptor.value_by_number(number).is_none() {
                return Err(InvariantViolation::UndeclaredEnumValue {
                    enum_name: descriptor.full_name().to_string(),
                    number,
                });
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// View a reflected message as its generated type, re-decoding dynamic
/// instances.
fn concrete<M: MessageFull + Clone>(message: &dyn MessageDyn) -> Result<M, InvariantViolation> {
    if let Some(m) = message.downcast_ref::<M>() {
        return Ok(m.clone());
    }
    let decode_error = |e: protobuf::Error| InvariantViolation::Decode {
        type_name: M::descriptor().full_name().to_string(),
        reason: e.to_string(),
    };
    let bytes = message.write_to_bytes_dyn().map_err(decode_error)?;
    M::parse_from_bytes(&bytes).map_err(decode_error)
}

fn well_known_descriptor(full_name: &str) -> Option<MessageDescriptor> {
    builtin_file_descriptors()
        .iter()
        .flat_map(|file| file.messages())
        .find(|m| m.full_name() == full_name)
}
