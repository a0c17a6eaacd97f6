//! Schema model.
//!
//! A [`Schema`] is the lowered, name-resolved form of an SDL document. It is
//! built once by the binder and never mutated afterwards.

use crate::scalar::ScalarRegistry;
use crate::value::ConstValue;
use indexmap::IndexMap;
use std::fmt;
use timeql_core::Interner;
use timeql_syntax::Type;

/// A GraphQL schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub description: Option<String>,
    pub query_type: String,
    pub types: IndexMap<String, TypeDef>,
    pub directives: IndexMap<String, DirectiveDef>,
    meta: MetaFields,
}

/// Field definitions the executor answers itself.
#[derive(Debug, Clone)]
struct MetaFields {
    typename: FieldDef,
    schema: FieldDef,
    type_: FieldDef,
}

impl Schema {
    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Gets an object type by name.
    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name) {
            Some(TypeDef::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Returns the query root type.
    pub fn query_root(&self) -> Option<&ObjectDef> {
        self.object(&self.query_type)
    }

    /// Looks up a field on an object type, including the meta-fields
    /// `__typename` (every object) and `__schema`/`__type` (query root).
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        match field_name {
            "__typename" => Some(&self.meta.typename),
            "__schema" if type_name == self.query_type => Some(&self.meta.schema),
            "__type" if type_name == self.query_type => Some(&self.meta.type_),
            _ => self.object(type_name)?.fields.get(field_name),
        }
    }

    /// Types declared by the application, excluding introspection types.
    pub fn user_types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values().filter(|ty| !ty.name().starts_with("__"))
    }

    /// Returns true if values of the type can appear in input position.
    pub fn is_input_type(&self, ty: &TypeRef) -> bool {
        matches!(
            self.types.get(ty.named_type()),
            Some(TypeDef::Scalar(_) | TypeDef::Enum(_) | TypeDef::InputObject(_))
        )
    }

    /// Returns true if the named type is a scalar or an enum.
    pub fn is_leaf_type(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(TypeDef::is_leaf)
    }

    /// Coerces an input value against a type.
    ///
    /// Scalars go through their codec, enums are checked against their
    /// values, input objects get their defaults applied, and a single value
    /// in list position is wrapped in a list.
    pub fn coerce_input(
        &self,
        scalars: &ScalarRegistry,
        ty: &TypeRef,
        value: &ConstValue,
    ) -> Result<ConstValue, String> {
        match ty {
            TypeRef::NonNull(inner) => {
                if value.is_null() {
                    return Err(format!(
                        "Expected non-nullable type \"{ty}\" not to be null."
                    ));
                }
                self.coerce_input(scalars, inner, value)
            }
            _ if value.is_null() => Ok(ConstValue::Null),
            TypeRef::List(inner) => match value {
                ConstValue::List(items) => items
                    .iter()
                    .map(|item| self.coerce_input(scalars, inner, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(ConstValue::List),
                single => Ok(ConstValue::List(vec![self.coerce_input(
                    scalars, inner, single,
                )?])),
            },
            TypeRef::Named(name) => match self.types.get(name) {
                Some(TypeDef::Scalar(_)) => {
                    let codec = scalars
                        .get(name)
                        .ok_or_else(|| format!("No codec registered for scalar \"{name}\"."))?;
                    codec.decode(value).map_err(|err| err.message)
                }
                Some(TypeDef::Enum(def)) => match value.as_str() {
                    Some(s) if def.values.contains_key(s) => Ok(ConstValue::Enum(s.to_string())),
                    Some(s) => Err(format!("Value \"{s}\" does not exist in \"{name}\" enum.")),
                    None => Err(format!("Enum \"{name}\" cannot represent value: {value}")),
                },
                Some(TypeDef::InputObject(def)) => self.coerce_input_object(scalars, def, value),
                Some(TypeDef::Object(_)) => Err(format!("Type \"{name}\" is not an input type.")),
                None => Err(format!("Unknown type \"{name}\".")),
            },
        }
    }

    fn coerce_input_object(
        &self,
        scalars: &ScalarRegistry,
        def: &InputObjectDef,
        value: &ConstValue,
    ) -> Result<ConstValue, String> {
        let ConstValue::Object(fields) = value else {
            return Err(format!("Expected type \"{}\" to be an object.", def.name));
        };
        if let Some(unknown) = fields.keys().find(|key| !def.fields.contains_key(*key)) {
            return Err(format!(
                "Field \"{unknown}\" is not defined by type \"{}\".",
                def.name
            ));
        }

        let mut coerced = IndexMap::with_capacity(def.fields.len());
        for field in def.fields.values() {
            match fields.get(&field.name) {
                Some(value) => {
                    let value = self
                        .coerce_input(scalars, &field.ty, value)
                        .map_err(|err| format!("In field \"{}\": {err}", field.name))?;
                    coerced.insert(field.name.clone(), value);
                }
                None => {
                    if let Some(default) = &field.default_value {
                        coerced.insert(field.name.clone(), default.clone());
                    } else if field.ty.is_non_null() {
                        return Err(format!(
                            "Field \"{}.{}\" of required type \"{}\" was not provided.",
                            def.name, field.name, field.ty
                        ));
                    }
                }
            }
        }
        Ok(ConstValue::Object(coerced))
    }
}

/// Kind of a type, as reported by introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::Enum => "ENUM",
            Self::InputObject => "INPUT_OBJECT",
            Self::List => "LIST",
            Self::NonNull => "NON_NULL",
        }
    }
}

/// A type definition.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(def) => &def.name,
            Self::Object(def) => &def.name,
            Self::Enum(def) => &def.name,
            Self::InputObject(def) => &def.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(def) => def.description.as_deref(),
            Self::Object(def) => def.description.as_deref(),
            Self::Enum(def) => def.description.as_deref(),
            Self::InputObject(def) => def.description.as_deref(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Object(_) => TypeKind::Object,
            Self::Enum(_) => TypeKind::Enum,
            Self::InputObject(_) => TypeKind::InputObject,
        }
    }

    /// Scalars and enums.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }
}

/// Scalar type definition.
#[derive(Debug, Clone)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
}

/// Object type definition.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

/// Enum type definition.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValueDef>,
}

/// Enum value definition.
#[derive(Debug, Clone)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
}

/// Input object type definition.
#[derive(Debug, Clone)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
}

/// Field definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
            deprecated: false,
            deprecation_reason: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: InputValueDef) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }
}

/// Argument or input field definition. Defaults are already coerced.
#[derive(Debug, Clone)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<ConstValue>,
}

impl InputValueDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Non-null without a default.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

/// Directive definition.
#[derive(Debug, Clone)]
pub struct DirectiveDef {
    pub name: String,
    pub description: Option<String>,
    pub arguments: IndexMap<String, InputValueDef>,
    pub locations: Vec<&'static str>,
}

/// Type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// `name!`
    pub fn named_non_null(name: impl Into<String>) -> Self {
        Self::Named(name.into()).non_null()
    }

    /// Wraps the type in non-null. Already non-null types are unchanged.
    #[must_use]
    pub fn non_null(self) -> Self {
        match self {
            Self::NonNull(_) => self,
            other => Self::NonNull(Box::new(other)),
        }
    }

    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Lowers a syntax type.
    pub fn from_ast(ty: &Type, interner: &Interner) -> Self {
        match ty {
            Type::Named(named) => Self::Named(interner.get(named.name)),
            Type::List(inner, _) => Self::list(Self::from_ast(inner, interner)),
            Type::NonNull(inner, _) => Self::NonNull(Box::new(Self::from_ast(inner, interner))),
        }
    }

    /// Returns the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::NonNull(inner) | Self::List(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strips one outer non-null wrapper.
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// Returns true if every value of `self` is a valid value of `other`:
    /// the types are identical, or `self` is non-null where `other` is
    /// nullable, at any depth.
    pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (Self::NonNull(a), Self::NonNull(b)) => a.is_subtype_of(b),
            (_, Self::NonNull(_)) => false,
            (Self::NonNull(a), b) => a.is_subtype_of(b),
            (Self::List(a), Self::List(b)) => a.is_subtype_of(b),
            (Self::Named(a), Self::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::NonNull(inner) => write!(f, "{inner}!"),
            Self::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// Schema builder.
#[derive(Debug)]
pub struct SchemaBuilder {
    description: Option<String>,
    query_type: String,
    types: IndexMap<String, TypeDef>,
    directives: IndexMap<String, DirectiveDef>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates a builder holding the built-in scalars and directives.
    pub fn new() -> Self {
        let mut builder = Self {
            description: None,
            query_type: "Query".to_string(),
            types: IndexMap::new(),
            directives: IndexMap::new(),
        };

        let scalars = ScalarRegistry::new();
        for name in scalars.names() {
            builder.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: scalars
                        .get(name)
                        .and_then(|codec| codec.description())
                        .map(str::to_string),
                }),
            );
        }

        let condition = |description: &str| {
            IndexMap::from([(
                "if".to_string(),
                InputValueDef::new("if", TypeRef::named_non_null("Boolean"))
                    .description(description),
            )])
        };
        builder.add_directive(DirectiveDef {
            name: "skip".to_string(),
            description: Some(
                "Directs the executor to skip this field or fragment when the `if` argument is true."
                    .to_string(),
            ),
            arguments: condition("Skipped when true."),
            locations: vec!["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
        });
        builder.add_directive(DirectiveDef {
            name: "include".to_string(),
            description: Some(
                "Directs the executor to include this field or fragment only when the `if` argument is true."
                    .to_string(),
            ),
            arguments: condition("Included when true."),
            locations: vec!["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
        });
        builder.add_directive(DirectiveDef {
            name: "deprecated".to_string(),
            description: Some(
                "Marks an element of a GraphQL schema as no longer supported.".to_string(),
            ),
            arguments: IndexMap::from([(
                "reason".to_string(),
                InputValueDef::new("reason", TypeRef::named("String"))
                    .default_value(ConstValue::from("No longer supported")),
            )]),
            locations: vec!["FIELD_DEFINITION", "ENUM_VALUE"],
        });

        builder
    }

    /// Sets the schema description.
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the query root type name.
    pub fn query_type(&mut self, name: impl Into<String>) -> &mut Self {
        self.query_type = name.into();
        self
    }

    /// Returns true if a type with this name was added.
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Gets a type added so far.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Adds a type, replacing any type with the same name.
    pub fn add_type(&mut self, type_def: TypeDef) -> &mut Self {
        self.types.insert(type_def.name().to_string(), type_def);
        self
    }

    /// Adds a directive definition.
    pub fn add_directive(&mut self, directive: DirectiveDef) -> &mut Self {
        self.directives.insert(directive.name.clone(), directive);
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        let meta = MetaFields {
            typename: FieldDef::new("__typename", TypeRef::named_non_null("String"))
                .description("The name of the current Object type at runtime."),
            schema: FieldDef::new("__schema", TypeRef::named_non_null("__Schema"))
                .description("Access the current type schema of this server."),
            type_: FieldDef::new("__type", TypeRef::named("__Type"))
                .description("Request the type information of a single type.")
                .argument(InputValueDef::new("name", TypeRef::named_non_null("String"))),
        };
        Schema {
            description: self.description,
            query_type: self.query_type,
            types: self.types,
            directives: self.directives,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::TimeScalar;

    fn sample() -> Schema {
        let mut builder = SchemaBuilder::new();
        builder
            .add_type(TypeDef::Scalar(ScalarDef {
                name: "Time".to_string(),
                description: None,
            }))
            .add_type(TypeDef::Enum(EnumDef {
                name: "Unit".to_string(),
                description: None,
                values: ["SECONDS", "MINUTES"]
                    .into_iter()
                    .map(|v| {
                        (
                            v.to_string(),
                            EnumValueDef {
                                name: v.to_string(),
                                description: None,
                                deprecated: false,
                                deprecation_reason: None,
                            },
                        )
                    })
                    .collect(),
            }))
            .add_type(TypeDef::InputObject(InputObjectDef {
                name: "Range".to_string(),
                description: None,
                fields: IndexMap::from([
                    (
                        "from".to_string(),
                        InputValueDef::new("from", TypeRef::named_non_null("Time")),
                    ),
                    (
                        "unit".to_string(),
                        InputValueDef::new("unit", TypeRef::named("Unit"))
                            .default_value(ConstValue::Enum("SECONDS".into())),
                    ),
                ]),
            }))
            .add_type(TypeDef::Object(ObjectDef {
                name: "Query".to_string(),
                description: None,
                fields: IndexMap::from([(
                    "today".to_string(),
                    FieldDef::new("today", TypeRef::named_non_null("Time")),
                )]),
            }));
        builder.build()
    }

    fn scalars() -> ScalarRegistry {
        let mut scalars = ScalarRegistry::new();
        scalars.register(TimeScalar);
        scalars
    }

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::list(TypeRef::named_non_null("Time")).non_null();
        assert_eq!(ty.to_string(), "[Time!]!");
        assert_eq!(ty.named_type(), "Time");
        assert!(ty.is_non_null());
        assert_eq!(ty.nullable().to_string(), "[Time!]");
    }

    #[test]
    fn test_type_ref_subtype() {
        let time = TypeRef::named("Time");
        let time_nn = TypeRef::named_non_null("Time");
        assert!(time_nn.is_subtype_of(&time));
        assert!(time.is_subtype_of(&time));
        assert!(!time.is_subtype_of(&time_nn));
        assert!(!time.is_subtype_of(&TypeRef::named("String")));

        let list_nn = TypeRef::list(time_nn.clone()).non_null();
        assert!(list_nn.is_subtype_of(&TypeRef::list(time.clone())));
        assert!(!TypeRef::list(time.clone()).is_subtype_of(&TypeRef::list(time_nn)));
        assert!(!time.is_subtype_of(&TypeRef::list(time.clone())));
    }

    #[test]
    fn test_meta_fields() {
        let schema = sample();
        assert!(schema.field("Query", "__typename").is_some());
        assert!(schema.field("Query", "__schema").is_some());
        assert_eq!(
            schema.field("Query", "__type").map(|f| f.ty.to_string()),
            Some("__Type".to_string())
        );
        assert!(schema.field("Range", "__schema").is_none());
        assert!(schema.field("Query", "today").is_some());
        assert!(schema.field("Query", "missing").is_none());
    }

    #[test]
    fn test_builtin_directives() {
        let schema = sample();
        assert!(schema.directives.contains_key("skip"));
        assert!(schema.directives.contains_key("include"));
        assert!(schema.directives.contains_key("deprecated"));
        assert!(schema.is_leaf_type("Int"));
        assert!(!schema.is_leaf_type("Query"));
    }

    #[test]
    fn test_coerce_non_null() {
        let schema = sample();
        let err = schema
            .coerce_input(&scalars(), &TypeRef::named_non_null("Time"), &ConstValue::Null)
            .unwrap_err();
        assert_eq!(err, "Expected non-nullable type \"Time!\" not to be null.");
        assert_eq!(
            schema
                .coerce_input(&scalars(), &TypeRef::named("Time"), &ConstValue::Null)
                .unwrap(),
            ConstValue::Null
        );
    }

    #[test]
    fn test_coerce_list_wraps_single_value() {
        let schema = sample();
        let value = schema
            .coerce_input(
                &scalars(),
                &TypeRef::list(TypeRef::named("Int")),
                &ConstValue::Int(3),
            )
            .unwrap();
        assert_eq!(value, ConstValue::List(vec![ConstValue::Int(3)]));
    }

    #[test]
    fn test_coerce_enum() {
        let schema = sample();
        let unit = TypeRef::named("Unit");
        assert_eq!(
            schema
                .coerce_input(&scalars(), &unit, &ConstValue::Enum("MINUTES".into()))
                .unwrap(),
            ConstValue::Enum("MINUTES".into())
        );
        let err = schema
            .coerce_input(&scalars(), &unit, &ConstValue::from("HOURS"))
            .unwrap_err();
        assert_eq!(err, "Value \"HOURS\" does not exist in \"Unit\" enum.");
    }

    #[test]
    fn test_coerce_input_object() {
        let schema = sample();
        let range = TypeRef::named("Range");
        let value = schema
            .coerce_input(
                &scalars(),
                &range,
                &ConstValue::object([("from", ConstValue::Int(0))]),
            )
            .unwrap();
        assert!(matches!(value.get("from"), Some(ConstValue::Time(_))));
        assert_eq!(value.get("unit"), Some(&ConstValue::Enum("SECONDS".into())));

        let err = schema
            .coerce_input(&scalars(), &range, &ConstValue::object::<&str, _>([]))
            .unwrap_err();
        assert_eq!(
            err,
            "Field \"Range.from\" of required type \"Time!\" was not provided."
        );

        let err = schema
            .coerce_input(
                &scalars(),
                &range,
                &ConstValue::object([("from", ConstValue::Int(0)), ("to", ConstValue::Int(1))]),
            )
            .unwrap_err();
        assert_eq!(err, "Field \"to\" is not defined by type \"Range\".");
    }

    #[test]
    fn test_coerce_scalar_error() {
        let schema = sample();
        let err = schema
            .coerce_input(&scalars(), &TypeRef::named("Time"), &ConstValue::from("soon"))
            .unwrap_err();
        assert!(err.starts_with("Time cannot represent value"));
    }
}
