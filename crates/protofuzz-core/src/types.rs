//! Message plans.
//!
//! A [`MessagePlan`] is the ordered list of field bindings of one message
//! type, each tagged with its shape (singular, repeated, map, oneof) and value
//! kind. Plans are derived from descriptors once and reused for every
//! generated instance.

use protobuf::descriptor::field_descriptor_proto::Label;
use protobuf::reflect::{
    EnumDescriptor, FieldDescriptor, MessageDescriptor, RuntimeFieldType, RuntimeType,
};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Well-known types from `google/protobuf/*.proto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    Any,
    Duration,
    Timestamp,
    Struct,
    Value,
    ListValue,
    FieldMask,
    Empty,
    DoubleValue,
    FloatValue,
    Int64Value,
    UInt64Value,
    Int32Value,
    UInt32Value,
    BoolValue,
    StringValue,
    BytesValue,
}

impl WellKnownType {
    pub const ALL: [WellKnownType; 17] = [
        WellKnownType::Any,
        WellKnownType::Duration,
        WellKnownType::Timestamp,
        WellKnownType::Struct,
        WellKnownType::Value,
        WellKnownType::ListValue,
        WellKnownType::FieldMask,
        WellKnownType::Empty,
        WellKnownType::DoubleValue,
        WellKnownType::FloatValue,
        WellKnownType::Int64Value,
        WellKnownType::UInt64Value,
        WellKnownType::Int32Value,
        WellKnownType::UInt32Value,
        WellKnownType::BoolValue,
        WellKnownType::StringValue,
        WellKnownType::BytesValue,
    ];

    /// Fully qualified protobuf name.
    pub fn full_name(&self) -> &'static str {
        match self {
            WellKnownType::Any => "google.protobuf.Any",
            WellKnownType::Duration => "google.protobuf.Duration",
            WellKnownType::Timestamp => "google.protobuf.Timestamp",
            WellKnownType::Struct => "google.protobuf.Struct",
            WellKnownType::Value => "google.protobuf.Value",
            WellKnownType::ListValue => "google.protobuf.ListValue",
            WellKnownType::FieldMask => "google.protobuf.FieldMask",
            WellKnownType::Empty => "google.protobuf.Empty",
            WellKnownType::DoubleValue => "google.protobuf.DoubleValue",
            WellKnownType::FloatValue => "google.protobuf.FloatValue",
            WellKnownType::Int64Value => "google.protobuf.Int64Value",
            WellKnownType::UInt64Value => "google.protobuf.UInt64Value",
            WellKnownType::Int32Value => "google.protobuf.Int32Value",
            WellKnownType::UInt32Value => "google.protobuf.UInt32Value",
            WellKnownType::BoolValue => "google.protobuf.BoolValue",
            WellKnownType::StringValue => "google.protobuf.StringValue",
            WellKnownType::BytesValue => "google.protobuf.BytesValue",
        }
    }

    pub fn from_full_name(name: &str) -> Option<Self> {
        let name = name.trim_start_matches('.');
        Self::ALL.into_iter().find(|wkt| wkt.full_name() == name)
    }
}

/// Primitive protobuf value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Bool,
    String,
    Bytes,
}

/// What a single value of a field holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Scalar(ScalarKind),
    Enum(EnumDescriptor),
    Message(MessageDescriptor),
}

impl ValueKind {
    pub fn from_runtime(runtime: RuntimeType) -> Self {
        match runtime {
            RuntimeType::I32 => ValueKind::Scalar(ScalarKind::I32),
            RuntimeType::I64 => ValueKind::Scalar(ScalarKind::I64),
            RuntimeType::U32 => ValueKind::Scalar(ScalarKind::U32),
            RuntimeType::U64 => ValueKind::Scalar(ScalarKind::U64),
            RuntimeType::F32 => ValueKind::Scalar(ScalarKind::F32),
            RuntimeType::F64 => ValueKind::Scalar(ScalarKind::F64),
            RuntimeType::Bool => ValueKind::Scalar(ScalarKind::Bool),
            RuntimeType::String => ValueKind::Scalar(ScalarKind::String),
            RuntimeType::VecU8 => ValueKind::Scalar(ScalarKind::Bytes),
            RuntimeType::Enum(e) => ValueKind::Enum(e),
            RuntimeType::Message(m) => ValueKind::Message(m),
        }
    }
}

/// One variant of a oneof.
#[derive(Clone)]
pub struct OneofVariant {
    pub field: FieldDescriptor,
    pub kind: ValueKind,
}

/// A field binding inside a [`MessagePlan`].
#[derive(Clone)]
pub enum FieldPlan {
    /// Plain field. `explicit_presence` is set for message fields, proto3
    /// `optional` fields and proto2 optional fields, which may be left
    /// absent.
    Singular {
        field: FieldDescriptor,
        kind: ValueKind,
        explicit_presence: bool,
    },
    Repeated {
        field: FieldDescriptor,
        kind: ValueKind,
    },
    Map {
        field: FieldDescriptor,
        key: ValueKind,
        value: ValueKind,
    },
    /// A real (non-synthetic) oneof, placed at the position of its first
    /// member. Variants keep declaration order.
    Oneof {
        name: String,
        variants: Vec<OneofVariant>,
    },
}

impl fmt::Debug for OneofVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneofVariant")
            .field("field", &self.field.full_name())
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Debug for FieldPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPlan::Singular {
                field,
                kind,
                explicit_presence,
            } => f
                .debug_struct("Singular")
                .field("field", &field.full_name())
                .field("kind", kind)
                .field("explicit_presence", explicit_presence)
                .finish(),
            FieldPlan::Repeated { field, kind } => f
                .debug_struct("Repeated")
                .field("field", &field.full_name())
                .field("kind", kind)
                .finish(),
            FieldPlan::Map { field, key, value } => f
                .debug_struct("Map")
                .field("field", &field.full_name())
                .field("key", key)
                .field("value", value)
                .finish(),
            FieldPlan::Oneof { name, variants } => f
                .debug_struct("Oneof")
                .field("name", name)
                .field("variants", variants)
                .finish(),
        }
    }
}

impl FieldPlan {
    /// Name of the bound field or oneof.
    pub fn name(&self) -> &str {
        match self {
            FieldPlan::Singular { field, .. }
            | FieldPlan::Repeated { field, .. }
            | FieldPlan::Map { field, .. } => field.name(),
            FieldPlan::Oneof { name, .. } => name,
        }
    }
}

/// Ordered field bindings of one message type.
#[derive(Debug, Clone)]
pub struct MessagePlan {
    full_name: String,
    proto3: bool,
    fields: Vec<FieldPlan>,
}

impl MessagePlan {
    pub fn from_descriptor(descriptor: &MessageDescriptor) -> Self {
        let oneof_names: Vec<String> = descriptor
            .proto()
            .oneof_decl
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        let proto3 = descriptor.file_descriptor().proto().syntax() == "proto3";

        let mut fields = Vec::new();
        let mut oneof_slots: HashMap<i32, usize> = HashMap::new();

        for field in descriptor.fields() {
            let proto = field.proto();
            let in_real_oneof = proto.has_oneof_index() && !proto.proto3_optional();

            if in_real_oneof {
                let index = proto.oneof_index();
                let kind = match field.runtime_field_type() {
                    RuntimeFieldType::Singular(t) => ValueKind::from_runtime(t),
                    // oneof members are always singular
                    _ => continue,
                };
                let variant = OneofVariant { field, kind };
                match oneof_slots.get(&index) {
                    Some(&slot) => {
                        if let FieldPlan::Oneof { variants, .. } = &mut fields[slot] {
                            variants.push(variant);
                        }
                    }
                    None => {
                        let name = oneof_names
                            .get(index as usize)
                            .cloned()
                            .unwrap_or_else(|| format!("oneof_{index}"));
                        oneof_slots.insert(index, fields.len());
                        fields.push(FieldPlan::Oneof {
                            name,
                            variants: vec![variant],
                        });
                    }
                }
                continue;
            }

            let plan = match field.runtime_field_type() {
                RuntimeFieldType::Singular(t) => {
                    let kind = ValueKind::from_runtime(t);
                    let required = proto.label() == Label::LABEL_REQUIRED;
                    let explicit_presence = !required
                        && (!proto3
                            || proto.proto3_optional()
                            || matches!(kind, ValueKind::Message(_)));
                    FieldPlan::Singular {
                        field,
                        kind,
                        explicit_presence,
                    }
                }
                RuntimeFieldType::Repeated(t) => FieldPlan::Repeated {
                    field,
                    kind: ValueKind::from_runtime(t),
                },
                RuntimeFieldType::Map(k, v) => FieldPlan::Map {
                    field,
                    key: ValueKind::from_runtime(k),
                    value: ValueKind::from_runtime(v),
                },
            };
            fields.push(plan);
        }

        Self {
            full_name: descriptor.full_name().to_string(),
            proto3,
            fields,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Whether the message is declared in a proto3 file, where the wire
    /// format never carries a default-valued singular scalar.
    pub fn is_proto3(&self) -> bool {
        self.proto3
    }

    pub fn fields(&self) -> &[FieldPlan] {
        &self.fields
    }
}

/// Plans for every message type reachable from a root.
#[derive(Debug, Clone, Default)]
pub struct MessagePlans {
    plans: HashMap<String, Arc<MessagePlan>>,
}

impl MessagePlans {
    /// Build plans for `root` and every message type reachable through its
    /// fields, skipping the types for which `skip` returns true.
    pub fn reachable_from<F>(root: &MessageDescriptor, skip: F) -> Self
    where
        F: Fn(&MessageDescriptor) -> bool,
    {
        let mut plans = HashMap::new();
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(descriptor) = queue.pop_front() {
            if plans.contains_key(descriptor.full_name()) {
                continue;
            }
            let plan = MessagePlan::from_descriptor(&descriptor);
            for kind in plan.fields().iter().flat_map(value_kinds) {
                if let ValueKind::Message(m) = kind {
                    if !skip(m) && !plans.contains_key(m.full_name()) {
                        queue.push_back(m.clone());
                    }
                }
            }
            tracing::debug!(
                message = plan.full_name(),
                fields = plan.fields().len(),
                "Built message plan"
            );
            plans.insert(descriptor.full_name().to_string(), Arc::new(plan));
        }

        Self { plans }
    }

    /// Plan for a message type, building an uncached one when the type was
    /// not reachable at construction time.
    pub fn plan(&self, descriptor: &MessageDescriptor) -> Arc<MessagePlan> {
        self.plans
            .get(descriptor.full_name())
            .cloned()
            .unwrap_or_else(|| Arc::new(MessagePlan::from_descriptor(descriptor)))
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.plans.contains_key(full_name)
    }
}

fn value_kinds(plan: &FieldPlan) -> Vec<&ValueKind> {
    match plan {
        FieldPlan::Singular { kind, .. } | FieldPlan::Repeated { kind, .. } => vec![kind],
        FieldPlan::Map { key, value, .. } => vec![key, value],
        FieldPlan::Oneof { variants, .. } => variants.iter().map(|v| &v.kind).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProtoSchema;

    const PROTO: &str = r#"
        syntax = "proto3";
        package plan.v1;

        import "google/protobuf/timestamp.proto";

        enum Color { COLOR_UNSPECIFIED = 0; RED = 1; }

        message Leaf { string id = 1; }

        message Root {
            int32 count = 1;
            optional string label = 2;
            oneof choice {
                string text = 3;
                Leaf leaf = 4;
            }
            repeated Color colors = 5;
            map<string, Leaf> leaves = 6;
            google.protobuf.Timestamp at = 7;
            Root child = 8;
        }
    "#;

    fn root() -> MessageDescriptor {
        ProtoSchema::from_string(PROTO)
            .unwrap()
            .get_message("plan.v1.Root")
            .unwrap()
    }

    #[test]
    fn test_plan_field_order_and_shapes() {
        let plan = MessagePlan::from_descriptor(&root());
        let names: Vec<&str> = plan.fields().iter().map(FieldPlan::name).collect();
        assert_eq!(
            names,
            vec!["count", "label", "choice", "colors", "leaves", "at", "child"]
        );

        match &plan.fields()[0] {
            FieldPlan::Singular {
                kind,
                explicit_presence,
                ..
            } => {
                assert_eq!(kind, &ValueKind::Scalar(ScalarKind::I32));
                assert!(!explicit_presence);
            }
            other => panic!("Expected singular, got {other:?}"),
        }
        assert!(matches!(
            &plan.fields()[1],
            FieldPlan::Singular {
                explicit_presence: true,
                ..
            }
        ));
        match &plan.fields()[2] {
            FieldPlan::Oneof { variants, .. } => {
                assert_eq!(variants.len(), 2);
                assert_eq!(variants[0].field.name(), "text");
                assert_eq!(variants[1].field.name(), "leaf");
            }
            other => panic!("Expected oneof, got {other:?}"),
        }
        assert!(matches!(&plan.fields()[3], FieldPlan::Repeated { .. }));
        assert!(matches!(&plan.fields()[4], FieldPlan::Map { .. }));
    }

    #[test]
    fn test_well_known_detection() {
        let plan = MessagePlan::from_descriptor(&root());
        match &plan.fields()[5] {
            FieldPlan::Singular { kind: ValueKind::Message(m), .. } => {
                assert_eq!(
                    WellKnownType::from_full_name(m.full_name()),
                    Some(WellKnownType::Timestamp)
                );
            }
            other => panic!("Expected singular, got {other:?}"),
        }
        assert_eq!(
            WellKnownType::from_full_name(".google.protobuf.Any"),
            Some(WellKnownType::Any)
        );
        assert_eq!(WellKnownType::from_full_name("plan.v1.Leaf"), None);
    }

    #[test]
    fn test_plan_debug_names_fields() {
        let plan = MessagePlan::from_descriptor(&root());
        let rendered = format!("{:?}", plan.fields()[2]);
        assert!(rendered.contains("Oneof"));
        assert!(rendered.contains("plan.v1.Root.text"));
        assert!(format!("{plan:?}").contains("plan.v1.Root.count"));
    }

    #[test]
    fn test_proto2_optional_scalars_have_presence() {
        let schema = ProtoSchema::from_string(
            r#"
            syntax = "proto2";
            package legacy;
            message Row {
                optional int32 id = 1;
                required string key = 2;
            }
        "#,
        )
        .unwrap();
        let plan = MessagePlan::from_descriptor(&schema.get_message("legacy.Row").unwrap());
        assert!(!plan.is_proto3());
        assert!(MessagePlan::from_descriptor(&root()).is_proto3());
        assert!(matches!(
            &plan.fields()[0],
            FieldPlan::Singular {
                explicit_presence: true,
                ..
            }
        ));
        assert!(matches!(
            &plan.fields()[1],
            FieldPlan::Singular {
                explicit_presence: false,
                ..
            }
        ));
    }

    #[test]
    fn test_reachable_plans_skip_and_recursion() {
        let plans = MessagePlans::reachable_from(&root(), |m| {
            WellKnownType::from_full_name(m.full_name()).is_some()
        });
        assert_eq!(plans.len(), 2);
        assert!(plans.contains("plan.v1.Root"));
        assert!(plans.contains("plan.v1.Leaf"));
        assert!(!plans.contains("google.protobuf.Timestamp"));
    }
}
