//! Query execution.
//!
//! A request is handled in two phases. [`prepare`] parses, validates and
//! plans the operation synchronously, producing an owned tree of
//! [`FieldPlan`]s. The plan is then executed: every root field runs on its
//! own task and the results are merged in document order.

use crate::binder::BoundSchema;
use crate::error::{GraphQLError, PathSegment, RequestError};
use crate::introspection;
use crate::resolver::{DefaultResolver, Resolver, ResolverArgs, ResolverInfo};
use crate::response::{Request, Response};
use crate::schema::{InputValueDef, TypeDef, TypeRef};
use crate::validation;
use crate::value::ConstValue;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde_json::Value as Json;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use timeql_core::{Interner, LineCol, LineIndex, Text};
use timeql_syntax::{
    parse, Argument, Definition, Directive, Document, FragmentDefinition, OperationDefinition,
    OperationType, Selection, SelectionSet, Value,
};
use tracing::{debug, error};

/// Executes requests against a bound schema.
#[derive(Clone)]
pub struct Executor {
    bound: Arc<BoundSchema>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("query_type", &self.bound.schema().query_type)
            .finish()
    }
}

impl Executor {
    /// Creates an executor.
    pub fn new(bound: impl Into<Arc<BoundSchema>>) -> Self {
        Self {
            bound: bound.into(),
        }
    }

    /// Gets the bound schema.
    pub fn schema(&self) -> &BoundSchema {
        &self.bound
    }

    /// Executes a request.
    ///
    /// Request-level failures produce a response without `data`; field
    /// failures are collected next to the partial data.
    pub async fn execute(&self, request: Request) -> Response {
        let started = Instant::now();
        debug!(
            operation = request.operation_name.as_deref().unwrap_or(""),
            "executing request"
        );

        let root = match prepare(&self.bound, &request) {
            Ok(root) => root,
            Err(errors) => {
                debug!(errors = errors.len(), "request rejected");
                return Response::from_request_errors(errors);
            }
        };

        let response = self.run(root).await;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            errors = response.errors.len(),
            "request executed"
        );
        response
    }

    async fn run(&self, root: IndexMap<String, FieldPlan>) -> Response {
        let root_value = ConstValue::Object(IndexMap::new());
        let mut handles = Vec::with_capacity(root.len());

        for (key, field) in root {
            let bound = Arc::clone(&self.bound);
            let parent = root_value.clone();
            let non_null = field.ty.is_non_null();
            let handle = tokio::spawn(async move {
                let ctx = ExecutionContext {
                    bound,
                    errors: Mutex::new(Vec::new()),
                };
                let result = execute_field(&field, &parent, Vec::new(), &ctx).await;
                (result, ctx.into_errors())
            });
            handles.push((key, non_null, handle));
        }

        let mut data = serde_json::Map::new();
        let mut data_is_null = false;
        let mut errors = Vec::new();

        for (key, non_null, handle) in handles {
            match handle.await {
                Ok((result, field_errors)) => {
                    errors.extend(field_errors);
                    match result {
                        Ok(value) => {
                            data.insert(key, value);
                        }
                        Err(Propagate) => data_is_null = true,
                    }
                }
                Err(err) => {
                    error!(field = %key, "field task failed: {err}");
                    errors.push(
                        GraphQLError::new(format!("Field execution failed: {err}"))
                            .with_path(vec![PathSegment::Field(key.clone())]),
                    );
                    if non_null {
                        data_is_null = true;
                    } else {
                        data.insert(key, Json::Null);
                    }
                }
            }
        }

        Response {
            data: Some(if data_is_null {
                Json::Null
            } else {
                Json::Object(data)
            }),
            errors,
        }
    }
}

/// A field to execute, with its arguments already coerced.
#[derive(Debug, Clone)]
struct FieldPlan {
    response_key: String,
    name: String,
    parent_type: String,
    ty: TypeRef,
    /// A literal that failed to coerce fails this field only.
    args: Result<ResolverArgs, String>,
    selection: IndexMap<String, FieldPlan>,
    location: LineCol,
}

/// Parses, validates and plans a request.
fn prepare(
    bound: &BoundSchema,
    request: &Request,
) -> Result<IndexMap<String, FieldPlan>, Vec<RequestError>> {
    let interner = Interner::new();
    let index = LineIndex::new(&request.query);
    let result = parse(&request.query, &interner);

    if result.diagnostics.has_errors() {
        return Err(result
            .diagnostics
            .errors()
            .map(|diagnostic| RequestError::Syntax {
                message: diagnostic.display_message().to_string(),
                location: diagnostic.primary_span().map(|span| index.span_start(span)),
            })
            .collect());
    }
    let document = result.document;

    let non_executable: Vec<RequestError> = document
        .definitions
        .iter()
        .filter(|definition| !definition.is_executable())
        .map(|definition| RequestError::NonExecutableDefinition {
            kind: match definition {
                Definition::Type(def) => format!("\"{}\"", interner.get(def.name().value)),
                _ => "schema".to_string(),
            },
            location: index.span_start(definition.span()),
        })
        .collect();
    if !non_executable.is_empty() {
        return Err(non_executable);
    }

    let operation = select_operation(&document, request.operation_name.as_deref(), &interner)
        .map_err(|err| vec![err])?;
    if operation.operation != OperationType::Query {
        return Err(vec![RequestError::UnsupportedOperation {
            operation: operation.operation.as_str().to_string(),
            location: index.span_start(operation.span),
        }]);
    }

    let schema = bound.schema();
    let errors = validation::validate(schema, &document, operation, &interner, &index);
    if !errors.is_empty() {
        return Err(errors);
    }

    let variables = coerce_variables(
        bound,
        operation,
        request.variables.as_ref(),
        &interner,
        &index,
    )?;

    let planner = Planner {
        bound,
        interner: &interner,
        index: &index,
        fragments: document
            .fragments()
            .map(|fragment| (fragment.name.value, fragment))
            .collect(),
        variables: &variables,
    };
    let mut root = IndexMap::new();
    planner.plan_selection_set(&operation.selection_set, &schema.query_type, &mut root);
    Ok(root)
}

fn select_operation<'d>(
    document: &'d Document<'d>,
    name: Option<&str>,
    interner: &Interner,
) -> Result<&'d OperationDefinition<'d>, RequestError> {
    match name {
        Some(name) => document
            .operations()
            .find(|op| op.name.is_some_and(|n| interner.is(n.value, name)))
            .ok_or_else(|| RequestError::UnknownOperation(name.to_string())),
        None => {
            let mut operations = document.operations();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation),
                (None, _) => Err(RequestError::NoOperation),
                (Some(_), Some(_)) => Err(RequestError::AmbiguousOperation),
            }
        }
    }
}

/// Coerces the provided variables against the operation's declarations.
///
/// Variables with neither a value nor a default are left out, so an
/// argument bound to one falls back to its own default.
fn coerce_variables(
    bound: &BoundSchema,
    operation: &OperationDefinition<'_>,
    provided: Option<&IndexMap<String, Json>>,
    interner: &Interner,
    index: &LineIndex<'_>,
) -> Result<IndexMap<String, ConstValue>, Vec<RequestError>> {
    let schema = bound.schema();
    let mut coerced = IndexMap::new();
    let mut errors = Vec::new();

    for definition in &operation.variables {
        let name = interner.get(definition.name.value);
        let ty = TypeRef::from_ast(&definition.ty, interner);
        let location = index.span_start(definition.span);

        match provided.and_then(|variables| variables.get(&name)) {
            Some(json) => {
                let value = ConstValue::from_json(json.clone());
                match schema.coerce_input(bound.scalars(), &ty, &value) {
                    Ok(value) => {
                        coerced.insert(name, value);
                    }
                    Err(message) => errors.push(RequestError::Variable {
                        name,
                        message: format!("got invalid value {json}; {message}"),
                        location,
                    }),
                }
            }
            None => {
                if let Some(default) = &definition.default_value {
                    let value = ConstValue::from_ast(default, interner, &IndexMap::new());
                    match schema.coerce_input(bound.scalars(), &ty, &value) {
                        Ok(value) => {
                            coerced.insert(name, value);
                        }
                        Err(message) => errors.push(RequestError::Variable {
                            name,
                            message: format!("has invalid default value {value}; {message}"),
                            location,
                        }),
                    }
                } else if ty.is_non_null() {
                    errors.push(RequestError::Variable {
                        name,
                        message: format!("of required type \"{ty}\" was not provided."),
                        location,
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Builds the owned plan of a validated operation.
struct Planner<'a, 'd> {
    bound: &'a BoundSchema,
    interner: &'a Interner,
    index: &'a LineIndex<'a>,
    fragments: FxHashMap<Text, &'d FragmentDefinition<'d>>,
    variables: &'a IndexMap<String, ConstValue>,
}

impl Planner<'_, '_> {
    /// Collects the fields of a selection set, expanding fragments that
    /// apply to `parent` and merging fields that share a response key.
    fn plan_selection_set(
        &self,
        set: &SelectionSet<'_>,
        parent: &str,
        out: &mut IndexMap<String, FieldPlan>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    if self.is_skipped(&field.directives) {
                        continue;
                    }
                    let key = self.interner.get(field.response_key().value);
                    if let Some(existing) = out.get_mut(&key) {
                        if let Some(set) = &field.selection_set {
                            let FieldPlan { ty, selection, .. } = existing;
                            self.plan_selection_set(set, ty.named_type(), selection);
                        }
                        continue;
                    }

                    let name = self.interner.get(field.name.value);
                    let Some(definition) = self.bound.schema().field(parent, &name) else {
                        continue;
                    };
                    let mut plan = FieldPlan {
                        response_key: key.clone(),
                        name,
                        parent_type: parent.to_string(),
                        ty: definition.ty.clone(),
                        args: self.coerce_arguments(&field.arguments, &definition.arguments),
                        selection: IndexMap::new(),
                        location: self.index.span_start(field.span),
                    };
                    if let Some(set) = &field.selection_set {
                        self.plan_selection_set(set, definition.ty.named_type(), &mut plan.selection);
                    }
                    out.insert(key, plan);
                }
                Selection::FragmentSpread(spread) => {
                    if self.is_skipped(&spread.directives) {
                        continue;
                    }
                    let Some(fragment) = self.fragments.get(&spread.name.value) else {
                        continue;
                    };
                    if self.interner.is(fragment.type_condition.value, parent) {
                        self.plan_selection_set(&fragment.selection_set, parent, out);
                    }
                }
                Selection::InlineFragment(inline) => {
                    if self.is_skipped(&inline.directives) {
                        continue;
                    }
                    let applies = inline
                        .type_condition
                        .map_or(true, |condition| self.interner.is(condition.value, parent));
                    if applies {
                        self.plan_selection_set(&inline.selection_set, parent, out);
                    }
                }
            }
        }
    }

    /// Evaluates `@skip(if:)` and `@include(if:)`.
    fn is_skipped(&self, directives: &[Directive<'_>]) -> bool {
        directives.iter().any(|directive| {
            let condition = directive
                .arguments
                .iter()
                .find(|argument| self.interner.is(argument.name.value, "if"))
                .map(|argument| ConstValue::from_ast(&argument.value, self.interner, self.variables));
            match condition {
                Some(ConstValue::Boolean(value)) if self.interner.is(directive.name.value, "skip") => value,
                Some(ConstValue::Boolean(value)) if self.interner.is(directive.name.value, "include") => {
                    !value
                }
                _ => false,
            }
        })
    }

    fn coerce_arguments(
        &self,
        arguments: &[Argument<'_>],
        definitions: &IndexMap<String, InputValueDef>,
    ) -> Result<ResolverArgs, String> {
        let mut args = ResolverArgs::new();
        for definition in definitions.values() {
            let provided = arguments
                .iter()
                .find(|argument| self.interner.is(argument.name.value, &definition.name))
                .filter(|argument| match &argument.value {
                    Value::Variable(name) => {
                        self.variables.contains_key(&self.interner.get(name.value))
                    }
                    _ => true,
                });

            match provided {
                Some(argument) => {
                    let raw = ConstValue::from_ast(&argument.value, self.interner, self.variables);
                    let value = self
                        .bound
                        .schema()
                        .coerce_input(self.bound.scalars(), &definition.ty, &raw)
                        .map_err(|message| {
                            format!(
                                "Argument \"{}\" has invalid value {raw}. {message}",
                                definition.name
                            )
                        })?;
                    args.set(definition.name.clone(), value);
                }
                None => {
                    if let Some(default) = &definition.default_value {
                        args.set(definition.name.clone(), default.clone());
                    } else if definition.ty.is_non_null() {
                        return Err(format!(
                            "Argument \"{}\" of required type \"{}\" was not provided.",
                            definition.name, definition.ty
                        ));
                    }
                }
            }
        }
        Ok(args)
    }
}

/// The position became null and its error has been recorded.
#[derive(Debug, Clone, Copy)]
struct Propagate;

type Completion = Result<Json, Propagate>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// State shared by the fields of one root task.
struct ExecutionContext {
    bound: Arc<BoundSchema>,
    errors: Mutex<Vec<GraphQLError>>,
}

impl ExecutionContext {
    fn record(&self, error: GraphQLError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    fn into_errors(self) -> Vec<GraphQLError> {
        self.errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an error raised by the field at `path`.
    fn field_error(&self, field: &FieldPlan, path: &[PathSegment], message: String) {
        self.record(
            GraphQLError::new(message)
                .with_location(field.location)
                .with_path(path.to_vec()),
        );
    }
}

/// Resolves and completes one field.
fn execute_field<'a>(
    field: &'a FieldPlan,
    parent: &'a ConstValue,
    mut path: Vec<PathSegment>,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, Completion> {
    Box::pin(async move {
        path.push(PathSegment::Field(field.response_key.clone()));
        match resolve_field(field, parent, &path, ctx).await {
            Ok(value) => complete_value(field, &field.ty, value, path, ctx).await,
            Err(error) => {
                ctx.record(
                    error
                        .with_location(field.location)
                        .with_path(path.clone()),
                );
                if field.ty.is_non_null() {
                    Err(Propagate)
                } else {
                    Ok(Json::Null)
                }
            }
        }
    })
}

async fn resolve_field(
    field: &FieldPlan,
    parent: &ConstValue,
    path: &[PathSegment],
    ctx: &ExecutionContext,
) -> Result<ConstValue, GraphQLError> {
    if field.name == "__typename" {
        return Ok(ConstValue::from(field.parent_type.as_str()));
    }
    let args = field
        .args
        .as_ref()
        .map_err(|message| GraphQLError::new(message.clone()))?;

    let bound = &ctx.bound;
    if let Some(value) =
        introspection::resolve(bound.schema(), &field.parent_type, &field.name, parent, args)
    {
        return Ok(value);
    }

    let info = ResolverInfo {
        parent_type: &field.parent_type,
        field_name: &field.name,
        return_type: &field.ty,
        path,
    };
    let result = match bound.resolvers().get(&field.parent_type, &field.name) {
        Some(descriptor) => descriptor.resolver().resolve(parent, args, &info).await,
        None => DefaultResolver.resolve(parent, args, &info).await,
    };
    result.map_err(|err| {
        debug!(
            field = %format!("{}.{}", field.parent_type, field.name),
            "resolver failed: {err}"
        );
        err.into_graphql_error()
    })
}

/// Completes a value at a position of type `ty`.
///
/// A non-null position turns `null` into an error and propagates; a
/// nullable position absorbs errors from below as `null`.
fn complete_value<'a>(
    field: &'a FieldPlan,
    ty: &'a TypeRef,
    value: ConstValue,
    path: Vec<PathSegment>,
    ctx: &'a ExecutionContext,
) -> BoxFuture<'a, Completion> {
    Box::pin(async move {
        match ty {
            TypeRef::NonNull(inner) => {
                let completed = complete_nullable(field, inner, value, path.clone(), ctx).await?;
                if completed.is_null() {
                    ctx.field_error(
                        field,
                        &path,
                        format!(
                            "Cannot return null for non-nullable field {}.{}.",
                            field.parent_type, field.name
                        ),
                    );
                    return Err(Propagate);
                }
                Ok(completed)
            }
            _ => Ok(complete_nullable(field, ty, value, path, ctx)
                .await
                .unwrap_or(Json::Null)),
        }
    })
}

async fn complete_nullable(
    field: &FieldPlan,
    ty: &TypeRef,
    value: ConstValue,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Completion {
    if value.is_null() {
        return Ok(Json::Null);
    }
    match ty {
        TypeRef::NonNull(_) => complete_value(field, ty, value, path, ctx).await,
        TypeRef::List(inner) => {
            let ConstValue::List(items) = value else {
                ctx.field_error(
                    field,
                    &path,
                    format!(
                        "Expected Iterable, but did not find one for field \"{}.{}\".",
                        field.parent_type, field.name
                    ),
                );
                return Err(Propagate);
            };
            let mut completed = Vec::with_capacity(items.len());
            let mut failed = false;
            for (i, item) in items.into_iter().enumerate() {
                let mut item_path = path.clone();
                item_path.push(PathSegment::Index(i));
                match complete_value(field, inner, item, item_path, ctx).await {
                    Ok(value) => completed.push(value),
                    Err(Propagate) => failed = true,
                }
            }
            if failed {
                Err(Propagate)
            } else {
                Ok(Json::Array(completed))
            }
        }
        TypeRef::Named(name) => complete_named(field, name, value, path, ctx).await,
    }
}

async fn complete_named(
    field: &FieldPlan,
    name: &str,
    value: ConstValue,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Completion {
    let bound = &ctx.bound;
    let message = match bound.schema().get_type(name) {
        Some(TypeDef::Scalar(_)) => match bound.scalars().get(name) {
            Some(codec) => match codec.encode(&value) {
                Ok(json) => return Ok(json),
                Err(err) => err.message,
            },
            None => format!("No codec registered for scalar \"{name}\"."),
        },
        Some(TypeDef::Enum(def)) => match value.as_str() {
            Some(s) if def.values.contains_key(s) => return Ok(Json::String(s.to_string())),
            _ => format!("Enum \"{name}\" cannot represent value: {value}"),
        },
        Some(TypeDef::Object(_)) => {
            return complete_object(&field.selection, &value, path, ctx).await;
        }
        Some(TypeDef::InputObject(_)) | None => {
            format!("Type \"{name}\" is not an output type.")
        }
    };
    ctx.field_error(field, &path, message);
    Err(Propagate)
}

/// Executes a sub-selection against an object value. Sibling fields all
/// run even when one of them propagates.
async fn complete_object(
    selection: &IndexMap<String, FieldPlan>,
    value: &ConstValue,
    path: Vec<PathSegment>,
    ctx: &ExecutionContext,
) -> Completion {
    let mut object = serde_json::Map::new();
    let mut failed = false;
    for (key, field) in selection {
        match execute_field(field, value, path.clone(), ctx).await {
            Ok(value) => {
                object.insert(key.clone(), value);
            }
            Err(Propagate) => failed = true,
        }
    }
    if failed {
        Err(Propagate)
    } else {
        Ok(Json::Object(object))
    }
}
