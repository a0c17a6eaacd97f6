//! Schema binding.
//!
//! [`SchemaBinder`] parses an SDL document, lowers it into a [`Schema`] and
//! checks it against the registered resolvers and scalar codecs. Every
//! problem found is collected into a single [`BindError`]; on success the
//! result is an immutable [`BoundSchema`] ready to be shared across requests.

use crate::introspection::INTROSPECTION_SDL;
use crate::resolver::{ResolverDescriptor, ResolverMap};
use crate::scalar::{ScalarCodec, ScalarRegistry};
use crate::schema::{
    EnumDef, EnumValueDef, FieldDef, InputObjectDef, InputValueDef, ObjectDef, ScalarDef, Schema,
    SchemaBuilder, TypeDef, TypeRef,
};
use crate::value::ConstValue;
use indexmap::IndexMap;
use thiserror::Error;
use timeql_core::{Diagnostic, Interner, LineCol, LineIndex};
use timeql_syntax::{
    parse, Definition, Directive, InputValueDefinition, OperationType, TypeDefinition, Value,
};

/// One problem found while binding.
#[derive(Debug, Clone, Error)]
pub enum BindIssue {
    #[error("syntax error{}: {}", at(.location), .diagnostic.display_message())]
    Syntax {
        diagnostic: Diagnostic,
        location: Option<LineCol>,
    },

    #[error("{kind} definitions are not allowed in a schema document")]
    UnexpectedDefinition { kind: &'static str },

    #[error("type `{0}` is defined more than once")]
    DuplicateType(String),

    #[error("field `{type_name}.{field}` is defined more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("name `{0}` is reserved for introspection")]
    ReservedName(String),

    #[error("query root type `{0}` is not defined")]
    MissingQueryRoot(String),

    #[error("query root type `{0}` is not an object type")]
    QueryRootNotObject(String),

    #[error("{operation} root type `{type_name}` is not supported")]
    UnsupportedOperationType {
        operation: &'static str,
        type_name: String,
    },

    #[error("unknown type `{type_name}` referenced by `{position}`")]
    UnknownType { type_name: String, position: String },

    #[error("`{position}` must have an {expected} type, found `{type_name}`")]
    WrongTypeKind {
        type_name: String,
        position: String,
        expected: &'static str,
    },

    #[error("invalid default value for `{position}`: {message}")]
    InvalidDefault { position: String, message: String },

    #[error("custom scalar `{0}` has no registered codec")]
    MissingCodec(String),

    #[error("root field `{0}` has no registered resolver")]
    MissingResolver(String),

    #[error("more than one resolver registered for `{0}`")]
    DuplicateResolver(String),

    #[error("resolver for `{field}` does not accept declared argument `{argument}`")]
    MissingArgument { field: String, argument: String },

    #[error("resolver for `{field}` expects argument `{argument}`, which the schema does not declare")]
    UnexpectedArgument { field: String, argument: String },

    #[error("argument `{argument}` of `{field}` is declared as `{declared}` but the resolver accepts `{accepted}`")]
    ArgumentMismatch {
        field: String,
        argument: String,
        declared: TypeRef,
        accepted: TypeRef,
    },

    #[error("resolver for `{field}` returns `{returned}`, which does not fit the declared type `{declared}`")]
    ReturnTypeMismatch {
        field: String,
        declared: TypeRef,
        returned: TypeRef,
    },
}

fn at(location: &Option<LineCol>) -> String {
    location.map_or_else(String::new, |loc| {
        format!(" at {}:{}", loc.line, loc.column)
    })
}

/// The schema could not be bound.
#[derive(Debug, Clone, Error)]
#[error("failed to bind schema: {}", summary(.issues))]
pub struct BindError {
    issues: Vec<BindIssue>,
}

fn summary(issues: &[BindIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BindError {
    /// All problems found, in discovery order.
    pub fn issues(&self) -> &[BindIssue] {
        &self.issues
    }
}

/// A schema validated against its resolvers and codecs.
#[derive(Debug)]
pub struct BoundSchema {
    schema: Schema,
    resolvers: ResolverMap,
    scalars: ScalarRegistry,
    sdl: String,
}

impl BoundSchema {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    pub fn scalars(&self) -> &ScalarRegistry {
        &self.scalars
    }

    /// The SDL the schema was bound from.
    pub fn sdl(&self) -> &str {
        &self.sdl
    }
}

/// Builder that binds an SDL document to resolvers and codecs.
#[derive(Debug)]
pub struct SchemaBinder {
    sdl: String,
    scalars: ScalarRegistry,
    resolvers: ResolverMap,
}

impl SchemaBinder {
    /// Starts binding a schema document. The built-in scalar codecs are
    /// registered already.
    pub fn new(sdl: impl Into<String>) -> Self {
        Self {
            sdl: sdl.into(),
            scalars: ScalarRegistry::new(),
            resolvers: ResolverMap::new(),
        }
    }

    /// Registers a scalar codec.
    #[must_use]
    pub fn codec<C: ScalarCodec + 'static>(mut self, codec: C) -> Self {
        self.scalars.register(codec);
        self
    }

    /// Sets the resolvers.
    #[must_use]
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Validates everything and produces the bound schema.
    pub fn bind(self) -> Result<BoundSchema, BindError> {
        let mut issues = Vec::new();
        let mut builder = SchemaBuilder::new();

        lower_document(INTROSPECTION_SDL, true, &mut builder, &mut issues);
        let query_type = lower_document(&self.sdl, false, &mut builder, &mut issues);
        if issues
            .iter()
            .any(|issue| matches!(issue, BindIssue::Syntax { .. }))
        {
            return Err(BindError { issues });
        }

        builder.query_type(query_type.unwrap_or_else(|| "Query".to_string()));
        let mut schema = builder.build();

        check_type_references(&schema, &mut issues);
        coerce_defaults(&mut schema, &self.scalars, &mut issues);
        check_query_root(&schema, &mut issues);
        check_codecs(&mut schema, &self.scalars, &mut issues);
        check_resolvers(&schema, &self.resolvers, &mut issues);

        if !issues.is_empty() {
            return Err(BindError { issues });
        }

        tracing::info!(
            query_type = %schema.query_type,
            types = schema.user_types().count(),
            resolvers = self.resolvers.len(),
            "schema bound"
        );
        Ok(BoundSchema {
            schema,
            resolvers: self.resolvers,
            scalars: self.scalars,
            sdl: self.sdl,
        })
    }
}

/// Lowers the type definitions of one document into the builder.
///
/// Returns the query root named by a `schema` definition, if any.
fn lower_document(
    source: &str,
    builtin: bool,
    builder: &mut SchemaBuilder,
    issues: &mut Vec<BindIssue>,
) -> Option<String> {
    let interner = Interner::new();
    let result = parse(source, &interner);
    if result.diagnostics.has_errors() {
        let index = LineIndex::new(source);
        issues.extend(result.diagnostics.errors().map(|diagnostic| BindIssue::Syntax {
            location: diagnostic.primary_span().map(|span| index.span_start(span)),
            diagnostic: diagnostic.clone(),
        }));
        return None;
    }

    let mut query_type = None;
    for definition in &result.document.definitions {
        match definition {
            Definition::Schema(schema) => {
                if let Some(description) = &schema.description {
                    builder.description(description.value.to_string());
                }
                for operation in &schema.operations {
                    let type_name = interner.get(operation.type_name.value);
                    match operation.operation {
                        OperationType::Query => query_type = Some(type_name),
                        other => issues.push(BindIssue::UnsupportedOperationType {
                            operation: other.as_str(),
                            type_name,
                        }),
                    }
                }
            }
            Definition::Type(definition) => {
                let def = lower_type(definition, &interner, builtin, issues);
                let name = def.name().to_string();
                if !builtin && name.starts_with("__") {
                    issues.push(BindIssue::ReservedName(name));
                } else if builder.contains_type(&name) {
                    issues.push(BindIssue::DuplicateType(name));
                } else {
                    builder.add_type(def);
                }
            }
            Definition::Operation(_) => issues.push(BindIssue::UnexpectedDefinition {
                kind: "operation",
            }),
            Definition::Fragment(_) => issues.push(BindIssue::UnexpectedDefinition {
                kind: "fragment",
            }),
        }
    }
    query_type
}

fn lower_type(
    definition: &TypeDefinition<'_>,
    interner: &Interner,
    builtin: bool,
    issues: &mut Vec<BindIssue>,
) -> TypeDef {
    let name = interner.get(definition.name().value);
    match definition {
        TypeDefinition::Scalar(def) => TypeDef::Scalar(ScalarDef {
            name,
            description: def.description.as_ref().map(|d| d.value.to_string()),
        }),
        TypeDefinition::Object(def) => {
            let mut fields = IndexMap::with_capacity(def.fields.len());
            for field in &def.fields {
                let field_name = interner.get(field.name.value);
                if !builtin && field_name.starts_with("__") {
                    issues.push(BindIssue::ReservedName(format!("{name}.{field_name}")));
                    continue;
                }
                let deprecation = deprecation(&field.directives, interner);
                let lowered = FieldDef {
                    name: field_name.clone(),
                    description: field.description.as_ref().map(|d| d.value.to_string()),
                    ty: TypeRef::from_ast(&field.ty, interner),
                    arguments: lower_input_values(
                        &field.arguments,
                        interner,
                        &format!("{name}.{field_name}"),
                        issues,
                    ),
                    deprecated: deprecation.is_some(),
                    deprecation_reason: deprecation,
                };
                if fields.insert(field_name.clone(), lowered).is_some() {
                    issues.push(BindIssue::DuplicateField {
                        type_name: name.clone(),
                        field: field_name,
                    });
                }
            }
            TypeDef::Object(ObjectDef {
                name,
                description: def.description.as_ref().map(|d| d.value.to_string()),
                fields,
            })
        }
        TypeDefinition::Enum(def) => {
            let mut values = IndexMap::with_capacity(def.values.len());
            for value in &def.values {
                let value_name = interner.get(value.name.value);
                let deprecation = deprecation(&value.directives, interner);
                let lowered = EnumValueDef {
                    name: value_name.clone(),
                    description: value.description.as_ref().map(|d| d.value.to_string()),
                    deprecated: deprecation.is_some(),
                    deprecation_reason: deprecation,
                };
                if values.insert(value_name.clone(), lowered).is_some() {
                    issues.push(BindIssue::DuplicateField {
                        type_name: name.clone(),
                        field: value_name,
                    });
                }
            }
            TypeDef::Enum(EnumDef {
                name,
                description: def.description.as_ref().map(|d| d.value.to_string()),
                values,
            })
        }
        TypeDefinition::Input(def) => TypeDef::InputObject(InputObjectDef {
            fields: lower_input_values(&def.fields, interner, &name, issues),
            name,
            description: def.description.as_ref().map(|d| d.value.to_string()),
        }),
    }
}

/// Lowers arguments or input fields. Defaults are kept as literals until
/// every type is known.
fn lower_input_values(
    values: &[InputValueDefinition<'_>],
    interner: &Interner,
    owner: &str,
    issues: &mut Vec<BindIssue>,
) -> IndexMap<String, InputValueDef> {
    let no_variables = IndexMap::new();
    let mut lowered = IndexMap::with_capacity(values.len());
    for value in values {
        let name = interner.get(value.name.value);
        let def = InputValueDef {
            name: name.clone(),
            description: value.description.as_ref().map(|d| d.value.to_string()),
            ty: TypeRef::from_ast(&value.ty, interner),
            default_value: value
                .default_value
                .as_ref()
                .map(|default| ConstValue::from_ast(default, interner, &no_variables)),
        };
        if lowered.insert(name.clone(), def).is_some() {
            issues.push(BindIssue::DuplicateField {
                type_name: owner.to_string(),
                field: name,
            });
        }
    }
    lowered
}

/// Reads `@deprecated(reason:)`.
fn deprecation(directives: &[Directive<'_>], interner: &Interner) -> Option<String> {
    let directive = directives
        .iter()
        .find(|directive| interner.is(directive.name.value, "deprecated"))?;
    let reason = directive
        .arguments
        .iter()
        .find(|argument| interner.is(argument.name.value, "reason"))
        .and_then(|argument| match &argument.value {
            Value::String(reason, _) => Some(reason.to_string()),
            _ => None,
        });
    Some(reason.unwrap_or_else(|| "No longer supported".to_string()))
}

fn check_type_references(schema: &Schema, issues: &mut Vec<BindIssue>) {
    let mut check = |ty: &TypeRef, position: String, input: bool| {
        let type_name = ty.named_type();
        match schema.get_type(type_name) {
            None => issues.push(BindIssue::UnknownType {
                type_name: type_name.to_string(),
                position,
            }),
            Some(TypeDef::Object(_)) if input => issues.push(BindIssue::WrongTypeKind {
                type_name: type_name.to_string(),
                position,
                expected: "input",
            }),
            Some(TypeDef::InputObject(_)) if !input => issues.push(BindIssue::WrongTypeKind {
                type_name: type_name.to_string(),
                position,
                expected: "output",
            }),
            Some(_) => {}
        }
    };

    for def in schema.types.values() {
        match def {
            TypeDef::Object(object) => {
                for field in object.fields.values() {
                    check(&field.ty, format!("{}.{}", object.name, field.name), false);
                    for argument in field.arguments.values() {
                        check(
                            &argument.ty,
                            format!("{}.{}({}:)", object.name, field.name, argument.name),
                            true,
                        );
                    }
                }
            }
            TypeDef::InputObject(input) => {
                for field in input.fields.values() {
                    check(&field.ty, format!("{}.{}", input.name, field.name), true);
                }
            }
            TypeDef::Scalar(_) | TypeDef::Enum(_) => {}
        }
    }
}

/// Replaces literal defaults with values coerced through the codecs.
fn coerce_defaults(schema: &mut Schema, scalars: &ScalarRegistry, issues: &mut Vec<BindIssue>) {
    let snapshot = schema.clone();
    let mut coerce = |value: &mut InputValueDef, position: String| {
        let Some(default) = value.default_value.as_ref() else {
            return;
        };
        if snapshot.get_type(value.ty.named_type()).is_none() {
            return;
        }
        match snapshot.coerce_input(scalars, &value.ty, default) {
            Ok(coerced) => value.default_value = Some(coerced),
            Err(message) => issues.push(BindIssue::InvalidDefault { position, message }),
        }
    };

    for def in schema.types.values_mut() {
        match def {
            TypeDef::Object(object) => {
                for field in object.fields.values_mut() {
                    for argument in field.arguments.values_mut() {
                        let position =
                            format!("{}.{}({}:)", object.name, field.name, argument.name);
                        coerce(argument, position);
                    }
                }
            }
            TypeDef::InputObject(input) => {
                for field in input.fields.values_mut() {
                    let position = format!("{}.{}", input.name, field.name);
                    coerce(field, position);
                }
            }
            TypeDef::Scalar(_) | TypeDef::Enum(_) => {}
        }
    }
}

fn check_query_root(schema: &Schema, issues: &mut Vec<BindIssue>) {
    match schema.get_type(&schema.query_type) {
        Some(TypeDef::Object(_)) => {}
        Some(_) => issues.push(BindIssue::QueryRootNotObject(schema.query_type.clone())),
        None => issues.push(BindIssue::MissingQueryRoot(schema.query_type.clone())),
    }
}

/// Every scalar needs a codec. Codec descriptions fill in missing ones.
fn check_codecs(schema: &mut Schema, scalars: &ScalarRegistry, issues: &mut Vec<BindIssue>) {
    for def in schema.types.values_mut() {
        let TypeDef::Scalar(scalar) = def else {
            continue;
        };
        match scalars.get(&scalar.name) {
            Some(codec) => {
                if scalar.description.is_none() {
                    scalar.description = codec.description().map(str::to_string);
                }
            }
            None => issues.push(BindIssue::MissingCodec(scalar.name.clone())),
        }
    }
}

fn check_resolvers(schema: &Schema, resolvers: &ResolverMap, issues: &mut Vec<BindIssue>) {
    issues.extend(
        resolvers
            .duplicates()
            .iter()
            .map(|key| BindIssue::DuplicateResolver(key.clone())),
    );

    if let Some(root) = schema.query_root() {
        for field in root.fields.values() {
            let position = format!("{}.{}", root.name, field.name);
            match resolvers.get(&root.name, &field.name) {
                Some(descriptor) => check_signature(&position, field, descriptor, issues),
                None => issues.push(BindIssue::MissingResolver(position)),
            }
        }
    }

    for (type_name, descriptor) in resolvers.iter() {
        let field = schema
            .object(type_name)
            .and_then(|object| object.fields.get(&descriptor.field));
        match field {
            Some(field) if type_name != schema.query_type => {
                let position = format!("{type_name}.{}", descriptor.field);
                check_signature(&position, field, descriptor, issues);
            }
            Some(_) => {}
            None => tracing::warn!(
                type_name,
                field = %descriptor.field,
                "ignoring resolver for a field the schema does not declare"
            ),
        }
    }
}

fn check_signature(
    position: &str,
    field: &FieldDef,
    descriptor: &ResolverDescriptor,
    issues: &mut Vec<BindIssue>,
) {
    for argument in field.arguments.values() {
        match descriptor.arguments.get(&argument.name) {
            None => issues.push(BindIssue::MissingArgument {
                field: position.to_string(),
                argument: argument.name.clone(),
            }),
            Some(accepted) if !argument.ty.is_subtype_of(accepted) => {
                issues.push(BindIssue::ArgumentMismatch {
                    field: position.to_string(),
                    argument: argument.name.clone(),
                    declared: argument.ty.clone(),
                    accepted: accepted.clone(),
                });
            }
            Some(_) => {}
        }
    }
    for name in descriptor.arguments.keys() {
        if !field.arguments.contains_key(name) {
            issues.push(BindIssue::UnexpectedArgument {
                field: position.to_string(),
                argument: name.clone(),
            });
        }
    }
    if !descriptor.return_type.is_subtype_of(&field.ty) {
        issues.push(BindIssue::ReturnTypeMismatch {
            field: position.to_string(),
            declared: field.ty.clone(),
            returned: descriptor.return_type.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainError, ResolverError};
    use crate::resolver::ResolverDescriptor;
    use crate::scalar::TimeScalar;
    use crate::value::Timestamp;
    use chrono::Utc;

    const SDL: &str = r#"
        scalar Time

        type Query {
          today: Time!
          distanceOfTimeToNowInWords(from: Time!): String!
          testError: String
        }
    "#;

    fn resolvers() -> ResolverMap {
        let mut map = ResolverMap::new();
        map.register(
            "Query",
            ResolverDescriptor::field("today").sync(|_| Ok(Utc::now().fixed_offset())),
        )
        .register(
            "Query",
            ResolverDescriptor::field("distanceOfTimeToNowInWords")
                .argument::<Timestamp>("from")
                .sync(|_| Ok(String::from("0 seconds"))),
        )
        .register(
            "Query",
            ResolverDescriptor::field("testError").sync(|_| {
                Err::<Option<String>, _>(ResolverError::from(DomainError::new("NotFound", "x")))
            }),
        );
        map
    }

    fn bind_issues(result: Result<BoundSchema, BindError>) -> Vec<String> {
        result
            .unwrap_err()
            .issues()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_bind_success() {
        let bound = SchemaBinder::new(SDL)
            .codec(TimeScalar)
            .resolvers(resolvers())
            .bind()
            .unwrap();
        assert_eq!(bound.schema().query_type, "Query");
        assert_eq!(bound.schema().query_root().unwrap().fields.len(), 3);
        assert!(bound.schema().get_type("__Type").is_some());
        assert!(bound.scalars().contains("Time"));
        assert_eq!(bound.sdl(), SDL);
    }

    #[test]
    fn test_bound_schema_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoundSchema>();
    }

    #[test]
    fn test_syntax_error() {
        let result = SchemaBinder::new("type Query { today: }")
            .codec(TimeScalar)
            .bind();
        let issues = bind_issues(result);
        assert_eq!(issues.len(), 1);
        insta::assert_snapshot!(issues[0], @"syntax error at 1:21: expected name, found `}`");
    }

    #[test]
    fn test_missing_codec_and_resolver() {
        let result = SchemaBinder::new(SDL).bind();
        let issues = bind_issues(result);
        assert_eq!(
            issues,
            [
                "custom scalar `Time` has no registered codec",
                "root field `Query.today` has no registered resolver",
                "root field `Query.distanceOfTimeToNowInWords` has no registered resolver",
                "root field `Query.testError` has no registered resolver",
            ]
        );
    }

    #[test]
    fn test_argument_compatibility() {
        let sdl = "scalar Time type Query { a(from: Time!): String! b(from: Time): String! }";
        let mut map = ResolverMap::new();
        map.register(
            "Query",
            ResolverDescriptor::field("a")
                .argument::<Option<Timestamp>>("from")
                .sync(|_| Ok(String::new())),
        )
        .register(
            "Query",
            ResolverDescriptor::field("b")
                .argument::<Timestamp>("from")
                .sync(|_| Ok(String::new())),
        );

        let issues = bind_issues(SchemaBinder::new(sdl).codec(TimeScalar).resolvers(map).bind());
        assert_eq!(
            issues,
            ["argument `from` of `Query.b` is declared as `Time` but the resolver accepts `Time!`"]
        );
    }

    #[test]
    fn test_return_compatibility() {
        let sdl = "type Query { a: String b: String! }";
        let mut map = ResolverMap::new();
        map.register("Query", ResolverDescriptor::field("a").sync(|_| Ok(String::new())))
            .register(
                "Query",
                ResolverDescriptor::field("b").sync(|_| Ok(None::<String>)),
            );

        let issues = bind_issues(SchemaBinder::new(sdl).resolvers(map).bind());
        assert_eq!(
            issues,
            ["resolver for `Query.b` returns `String`, which does not fit the declared type `String!`"]
        );
    }

    #[test]
    fn test_argument_names_must_match() {
        let sdl = "type Query { a(x: Int): Int }";
        let mut map = ResolverMap::new();
        map.register(
            "Query",
            ResolverDescriptor::field("a")
                .argument::<Option<i32>>("y")
                .sync(|_| Ok(None::<i32>)),
        );

        let issues = bind_issues(SchemaBinder::new(sdl).resolvers(map).bind());
        assert_eq!(
            issues,
            [
                "resolver for `Query.a` does not accept declared argument `x`",
                "resolver for `Query.a` expects argument `y`, which the schema does not declare",
            ]
        );
    }

    #[test]
    fn test_extra_resolver_is_ignored() {
        let mut map = resolvers();
        map.register("Query", ResolverDescriptor::field("extra").sync(|_| Ok(true)));
        map.register("Nope", ResolverDescriptor::field("x").sync(|_| Ok(true)));
        assert!(SchemaBinder::new(SDL)
            .codec(TimeScalar)
            .resolvers(map)
            .bind()
            .is_ok());
    }

    #[test]
    fn test_duplicate_resolver() {
        let mut map = resolvers();
        map.register(
            "Query",
            ResolverDescriptor::field("today").sync(|_| Ok(Utc::now().fixed_offset())),
        );
        let issues = bind_issues(SchemaBinder::new(SDL).codec(TimeScalar).resolvers(map).bind());
        assert_eq!(issues, ["more than one resolver registered for `Query.today`"]);
    }

    #[test]
    fn test_schema_shape_issues() {
        let sdl = r#"
            schema { query: Root mutation: Mutation }
            type Mutation { a: Int }
            type Mutation { b: Int }
            type Root { a: Missing b(x: Root): Int }
            type __Secret { a: Int }
        "#;
        let issues = bind_issues(SchemaBinder::new(sdl).bind());
        assert_eq!(
            issues,
            [
                "mutation root type `Mutation` is not supported",
                "type `Mutation` is defined more than once",
                "name `__Secret` is reserved for introspection",
                "unknown type `Missing` referenced by `Root.a`",
                "`Root.b(x:)` must have an input type, found `Root`",
                "root field `Root.a` has no registered resolver",
                "root field `Root.b` has no registered resolver",
            ]
        );
    }

    #[test]
    fn test_missing_query_root() {
        let issues = bind_issues(SchemaBinder::new("enum Query { A }").bind());
        assert_eq!(issues, ["query root type `Query` is not an object type"]);

        let issues = bind_issues(SchemaBinder::new("type Other { a: Int }").bind());
        assert_eq!(issues, ["query root type `Query` is not defined"]);
    }

    #[test]
    fn test_defaults_are_coerced() {
        let sdl = r#"
            scalar Time
            type Query {
              a(from: Time = "2019-01-01T00:00:00Z"): Int
              b(from: Time = "later"): Int
            }
        "#;
        let mut map = ResolverMap::new();
        for field in ["a", "b"] {
            map.register(
                "Query",
                ResolverDescriptor::field(field)
                    .argument::<Option<Timestamp>>("from")
                    .sync(|_| Ok(None::<i32>)),
            );
        }
        let issues = bind_issues(
            SchemaBinder::new(sdl)
                .codec(TimeScalar)
                .resolvers(map.clone())
                .bind(),
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0]
            .starts_with("invalid default value for `Query.b(from:)`: Time cannot represent value"));

        let bound = SchemaBinder::new(sdl.replace("\"later\"", "0"))
            .codec(TimeScalar)
            .resolvers(map)
            .bind()
            .unwrap();
        let default = &bound.schema().query_root().unwrap().fields["a"].arguments["from"]
            .default_value;
        assert!(matches!(default, Some(ConstValue::Time(_))));
    }

    #[test]
    fn test_deprecation_and_descriptions() {
        let sdl = r#"
            "The root."
            type Query {
              "Old field."
              old: Int @deprecated
              older: Int @deprecated(reason: "use new")
            }
        "#;
        let mut map = ResolverMap::new();
        map.register("Query", ResolverDescriptor::field("old").sync(|_| Ok(None::<i32>)))
            .register("Query", ResolverDescriptor::field("older").sync(|_| Ok(None::<i32>)));
        let bound = SchemaBinder::new(sdl).resolvers(map).bind().unwrap();
        let root = bound.schema().query_root().unwrap();
        assert_eq!(root.description.as_deref(), Some("The root."));
        assert_eq!(root.fields["old"].description.as_deref(), Some("Old field."));
        assert_eq!(
            root.fields["old"].deprecation_reason.as_deref(),
            Some("No longer supported")
        );
        assert_eq!(root.fields["older"].deprecation_reason.as_deref(), Some("use new"));
    }
}
