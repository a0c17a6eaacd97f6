//! Introspection: `__schema`, `__type` and the `__*` meta-types.
//!
//! The meta-types are declared in SDL and lowered into every schema. Their
//! values are plain [`ConstValue`] objects read by the default resolver;
//! only the `__Type` fields that would recurse through the type graph are
//! computed on demand by [`resolve`].

use crate::resolver::ResolverArgs;
use crate::schema::{FieldDef, InputValueDef, Schema, TypeDef, TypeKind, TypeRef};
use crate::value::ConstValue;

/// SDL of the introspection types.
pub const INTROSPECTION_SDL: &str = r#"
type __Schema {
  description: String
  types: [__Type!]!
  queryType: __Type!
  mutationType: __Type
  subscriptionType: __Type
  directives: [__Directive!]!
}

type __Type {
  kind: __TypeKind!
  name: String
  description: String
  specifiedByURL: String
  fields(includeDeprecated: Boolean = false): [__Field!]
  interfaces: [__Type!]
  possibleTypes: [__Type!]
  enumValues(includeDeprecated: Boolean = false): [__EnumValue!]
  inputFields(includeDeprecated: Boolean = false): [__InputValue!]
  ofType: __Type
}

enum __TypeKind {
  SCALAR
  OBJECT
  INTERFACE
  UNION
  ENUM
  INPUT_OBJECT
  LIST
  NON_NULL
}

type __Field {
  name: String!
  description: String
  args(includeDeprecated: Boolean = false): [__InputValue!]!
  type: __Type!
  isDeprecated: Boolean!
  deprecationReason: String
}

type __InputValue {
  name: String!
  description: String
  type: __Type!
  defaultValue: String
  isDeprecated: Boolean!
  deprecationReason: String
}

type __EnumValue {
  name: String!
  description: String
  isDeprecated: Boolean!
  deprecationReason: String
}

type __Directive {
  name: String!
  description: String
  isRepeatable: Boolean!
  locations: [__DirectiveLocation!]!
  args(includeDeprecated: Boolean = false): [__InputValue!]!
}

enum __DirectiveLocation {
  QUERY
  MUTATION
  SUBSCRIPTION
  FIELD
  FRAGMENT_DEFINITION
  FRAGMENT_SPREAD
  INLINE_FRAGMENT
  VARIABLE_DEFINITION
  SCHEMA
  SCALAR
  OBJECT
  FIELD_DEFINITION
  ARGUMENT_DEFINITION
  INTERFACE
  UNION
  ENUM
  ENUM_VALUE
  INPUT_OBJECT
  INPUT_FIELD_DEFINITION
}
"#;

/// Resolves the introspection fields that are not plain properties.
///
/// Returns `None` when the field should be read from the parent value.
pub fn resolve(
    schema: &Schema,
    parent_type: &str,
    field_name: &str,
    parent: &ConstValue,
    args: &ResolverArgs,
) -> Option<ConstValue> {
    if parent_type == schema.query_type {
        return match field_name {
            "__schema" => Some(schema_value(schema)),
            "__type" => Some(
                args.get("name")
                    .and_then(ConstValue::as_str)
                    .and_then(|name| schema.get_type(name))
                    .map_or(ConstValue::Null, named_type_value),
            ),
            _ => None,
        };
    }
    if parent_type != "__Type" {
        return None;
    }

    let include_deprecated = matches!(
        args.get("includeDeprecated"),
        Some(ConstValue::Boolean(true))
    );
    let def = parent
        .get("name")
        .and_then(ConstValue::as_str)
        .and_then(|name| schema.get_type(name));

    match field_name {
        "fields" => Some(match def {
            Some(TypeDef::Object(object)) => ConstValue::List(
                object
                    .fields
                    .values()
                    .filter(|field| include_deprecated || !field.deprecated)
                    .map(|field| field_value(schema, field))
                    .collect(),
            ),
            _ => ConstValue::Null,
        }),
        "enumValues" => Some(match def {
            Some(TypeDef::Enum(def)) => ConstValue::List(
                def.values
                    .values()
                    .filter(|value| include_deprecated || !value.deprecated)
                    .map(|value| {
                        ConstValue::object([
                            ("name", ConstValue::from(value.name.as_str())),
                            ("description", ConstValue::from(value.description.clone())),
                            ("isDeprecated", ConstValue::Boolean(value.deprecated)),
                            (
                                "deprecationReason",
                                ConstValue::from(value.deprecation_reason.clone()),
                            ),
                        ])
                    })
                    .collect(),
            ),
            _ => ConstValue::Null,
        }),
        "inputFields" => Some(match def {
            Some(TypeDef::InputObject(def)) => ConstValue::List(
                def.fields
                    .values()
                    .map(|value| input_value(schema, value))
                    .collect(),
            ),
            _ => ConstValue::Null,
        }),
        "interfaces" => Some(match def {
            Some(TypeDef::Object(_)) => ConstValue::List(Vec::new()),
            _ => ConstValue::Null,
        }),
        "possibleTypes" => Some(ConstValue::Null),
        _ => None,
    }
}

fn schema_value(schema: &Schema) -> ConstValue {
    let query_type = schema
        .get_type(&schema.query_type)
        .map_or(ConstValue::Null, named_type_value);
    ConstValue::object([
        ("description", ConstValue::from(schema.description.clone())),
        (
            "types",
            ConstValue::List(schema.types.values().map(named_type_value).collect()),
        ),
        ("queryType", query_type),
        ("mutationType", ConstValue::Null),
        ("subscriptionType", ConstValue::Null),
        (
            "directives",
            ConstValue::List(
                schema
                    .directives
                    .values()
                    .map(|directive| {
                        ConstValue::object([
                            ("name", ConstValue::from(directive.name.as_str())),
                            ("description", ConstValue::from(directive.description.clone())),
                            ("isRepeatable", ConstValue::Boolean(false)),
                            (
                                "locations",
                                ConstValue::List(
                                    directive
                                        .locations
                                        .iter()
                                        .map(|location| ConstValue::Enum(location.to_string()))
                                        .collect(),
                                ),
                            ),
                            (
                                "args",
                                ConstValue::List(
                                    directive
                                        .arguments
                                        .values()
                                        .map(|value| input_value(schema, value))
                                        .collect(),
                                ),
                            ),
                        ])
                    })
                    .collect(),
            ),
        ),
    ])
}

/// A `__Type` for a named type. Its list-valued fields are filled in by
/// [`resolve`].
fn named_type_value(def: &TypeDef) -> ConstValue {
    ConstValue::object([
        ("kind", ConstValue::Enum(def.kind().as_str().to_string())),
        ("name", ConstValue::from(def.name())),
        ("description", ConstValue::from(def.description())),
        ("specifiedByURL", ConstValue::Null),
        ("ofType", ConstValue::Null),
    ])
}

/// A `__Type` for a type reference, wrappers included.
fn type_value(schema: &Schema, ty: &TypeRef) -> ConstValue {
    let (kind, of_type) = match ty {
        TypeRef::Named(name) => {
            return schema
                .get_type(name)
                .map_or(ConstValue::Null, named_type_value);
        }
        TypeRef::NonNull(inner) => (TypeKind::NonNull, inner),
        TypeRef::List(inner) => (TypeKind::List, inner),
    };
    ConstValue::object([
        ("kind", ConstValue::Enum(kind.as_str().to_string())),
        ("name", ConstValue::Null),
        ("description", ConstValue::Null),
        ("specifiedByURL", ConstValue::Null),
        ("ofType", type_value(schema, of_type)),
    ])
}

fn field_value(schema: &Schema, field: &FieldDef) -> ConstValue {
    ConstValue::object([
        ("name", ConstValue::from(field.name.as_str())),
        ("description", ConstValue::from(field.description.clone())),
        (
            "args",
            ConstValue::List(
                field
                    .arguments
                    .values()
                    .map(|value| input_value(schema, value))
                    .collect(),
            ),
        ),
        ("type", type_value(schema, &field.ty)),
        ("isDeprecated", ConstValue::Boolean(field.deprecated)),
        (
            "deprecationReason",
            ConstValue::from(field.deprecation_reason.clone()),
        ),
    ])
}

fn input_value(schema: &Schema, value: &InputValueDef) -> ConstValue {
    ConstValue::object([
        ("name", ConstValue::from(value.name.as_str())),
        ("description", ConstValue::from(value.description.clone())),
        ("type", type_value(schema, &value.ty)),
        (
            "defaultValue",
            ConstValue::from(value.default_value.as_ref().map(ToString::to_string)),
        ),
        ("isDeprecated", ConstValue::Boolean(false)),
        ("deprecationReason", ConstValue::Null),
    ])
}
