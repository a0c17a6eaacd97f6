//! Validation of an executable document against a schema.
//!
//! Runs after parsing and before variables are coerced. Literal argument
//! values are not checked here; they are coerced per field during
//! execution so a bad literal only fails its own field.

use crate::error::RequestError;
use crate::schema::{InputValueDef, Schema, TypeDef, TypeRef};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use timeql_core::{Interner, LineCol, LineIndex, Span, Text};
use timeql_syntax::{
    Argument, Definition, Directive, Document, FieldSelection, FragmentDefinition, Name,
    OperationDefinition, Selection, SelectionSet, Value, VariableDefinition,
};

/// Validates the selected operation and the fragments of its document.
pub(crate) fn validate<'d>(
    schema: &Schema,
    document: &'d Document<'d>,
    operation: &'d OperationDefinition<'d>,
    interner: &Interner,
    index: &LineIndex<'_>,
) -> Vec<RequestError> {
    let mut validator = Validator {
        schema,
        interner,
        index,
        operation,
        fragments: FxHashMap::default(),
        variables: FxHashMap::default(),
        used_variables: FxHashSet::default(),
        fragment_stack: Vec::new(),
        visited_fragments: FxHashSet::default(),
        errors: Vec::new(),
    };
    validator.check_fragments(document);
    validator.check_variable_definitions();
    validator.check_directives(&operation.directives, "QUERY");
    validator.visit_selection_set(&operation.selection_set, &schema.query_type);
    validator.check_unused_variables();
    validator.errors
}

struct Validator<'s, 'd> {
    schema: &'s Schema,
    interner: &'s Interner,
    index: &'s LineIndex<'s>,
    operation: &'d OperationDefinition<'d>,
    fragments: FxHashMap<Text, &'d FragmentDefinition<'d>>,
    variables: FxHashMap<Text, &'d VariableDefinition<'d>>,
    used_variables: FxHashSet<Text>,
    fragment_stack: Vec<Text>,
    visited_fragments: FxHashSet<Text>,
    errors: Vec<RequestError>,
}

/// Who owns an argument list, for messages.
#[derive(Clone, Copy)]
enum ArgumentOwner<'a> {
    Field { parent: &'a str, name: &'a str },
    Directive(&'a str),
}

impl<'s, 'd> Validator<'s, 'd> {
    fn location(&self, span: Span) -> LineCol {
        self.index.span_start(span)
    }

    fn report(&mut self, message: String, spans: &[Span]) {
        let error = RequestError::Validation {
            message,
            locations: spans.iter().map(|span| self.location(*span)).collect(),
        };
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    fn name(&self, text: Text) -> String {
        self.interner.get(text)
    }

    fn check_fragments(&mut self, document: &'d Document<'d>) {
        for fragment in document.fragments() {
            let name = fragment.name.value;
            if let Some(previous) = self.fragments.get(&name) {
                let spans = [previous.name.span, fragment.name.span];
                self.report(
                    format!(
                        "There can be only one fragment named \"{}\".",
                        self.name(name)
                    ),
                    &spans,
                );
                continue;
            }
            self.fragments.insert(name, fragment);

            let condition = self.name(fragment.type_condition.value);
            match self.schema.get_type(&condition) {
                None => self.report(
                    format!("Unknown type \"{condition}\"."),
                    &[fragment.type_condition.span],
                ),
                Some(TypeDef::Object(_)) => {}
                Some(_) => self.report(
                    format!(
                        "Fragment \"{}\" cannot condition on non composite type \"{condition}\".",
                        self.name(name)
                    ),
                    &[fragment.type_condition.span],
                ),
            }
            self.check_directives(&fragment.directives, "FRAGMENT_DEFINITION");
        }

        let mut spread = FxHashSet::default();
        for definition in &document.definitions {
            match definition {
                Definition::Operation(op) => {
                    collect_spreads(&op.selection_set, &mut spread);
                }
                Definition::Fragment(fragment) => {
                    collect_spreads(&fragment.selection_set, &mut spread);
                }
                _ => {}
            }
        }
        for fragment in document.fragments() {
            if !spread.contains(&fragment.name.value) {
                self.report(
                    format!(
                        "Fragment \"{}\" is never used.",
                        self.name(fragment.name.value)
                    ),
                    &[fragment.span],
                );
            }
        }
    }

    fn check_variable_definitions(&mut self) {
        let operation = self.operation;
        for definition in &operation.variables {
            let name = definition.name.value;
            if self.variables.contains_key(&name) {
                self.report(
                    format!(
                        "There can be only one variable named \"${}\".",
                        self.name(name)
                    ),
                    &[definition.name.span],
                );
                continue;
            }
            self.variables.insert(name, definition);

            let ty = TypeRef::from_ast(&definition.ty, self.interner);
            match self.schema.get_type(ty.named_type()) {
                None => self.report(
                    format!("Unknown type \"{}\".", ty.named_type()),
                    &[definition.ty.span()],
                ),
                Some(_) if !self.schema.is_input_type(&ty) => self.report(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{ty}\".",
                        self.name(name)
                    ),
                    &[definition.ty.span()],
                ),
                Some(_) => {}
            }
            self.check_directives(&definition.directives, "VARIABLE_DEFINITION");
        }
    }

    fn check_unused_variables(&mut self) {
        let operation = self.operation;
        let suffix = operation
            .name
            .map(|name| format!(" in operation \"{}\"", self.name(name.value)))
            .unwrap_or_default();
        for definition in &operation.variables {
            if !self.used_variables.contains(&definition.name.value) {
                self.report(
                    format!(
                        "Variable \"${}\" is never used{suffix}.",
                        self.name(definition.name.value)
                    ),
                    &[definition.span],
                );
            }
        }
    }

    fn check_directives(&mut self, directives: &[Directive<'_>], location: &'static str) {
        let schema = self.schema;
        let mut seen = FxHashSet::default();
        for directive in directives {
            let name = self.name(directive.name.value);
            let Some(definition) = schema.directives.get(&name) else {
                self.report(
                    format!("Unknown directive \"@{name}\"."),
                    &[directive.span],
                );
                continue;
            };
            if !definition.locations.contains(&location) {
                self.report(
                    format!("Directive \"@{name}\" may not be used on {location}."),
                    &[directive.span],
                );
            }
            if !seen.insert(directive.name.value) {
                self.report(
                    format!("The directive \"@{name}\" can only be used once at this location."),
                    &[directive.span],
                );
            }
            self.check_arguments(
                &directive.arguments,
                &definition.arguments,
                ArgumentOwner::Directive(&name),
                directive.span,
            );
        }
    }

    fn visit_selection_set(&mut self, set: &SelectionSet<'_>, parent: &str) {
        self.check_conflicts(set);
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => self.visit_field(field, parent),
                Selection::FragmentSpread(spread) => {
                    self.check_directives(&spread.directives, "FRAGMENT_SPREAD");
                    let name = spread.name.value;
                    let Some(fragment) = self.fragments.get(&name).copied() else {
                        self.report(
                            format!("Unknown fragment \"{}\".", self.name(name)),
                            &[spread.name.span],
                        );
                        continue;
                    };
                    let condition = self.name(fragment.type_condition.value);
                    if condition != parent && self.schema.object(&condition).is_some() {
                        self.report(
                            format!(
                                "Fragment \"{}\" cannot be spread here as objects of type \"{parent}\" can never be of type \"{condition}\".",
                                self.name(name)
                            ),
                            &[spread.span],
                        );
                    }
                    if self.fragment_stack.contains(&name) {
                        self.report(
                            format!("Cannot spread fragment \"{}\" within itself.", self.name(name)),
                            &[spread.span],
                        );
                        continue;
                    }
                    if self.visited_fragments.insert(name)
                        && self.schema.object(&condition).is_some()
                    {
                        self.fragment_stack.push(name);
                        self.visit_selection_set(&fragment.selection_set, &condition);
                        self.fragment_stack.pop();
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.check_directives(&inline.directives, "INLINE_FRAGMENT");
                    let Some(condition) = inline.type_condition else {
                        self.visit_selection_set(&inline.selection_set, parent);
                        continue;
                    };
                    let condition_name = self.name(condition.value);
                    match self.schema.get_type(&condition_name) {
                        None => self.report(
                            format!("Unknown type \"{condition_name}\"."),
                            &[condition.span],
                        ),
                        Some(TypeDef::Object(_)) => {
                            if condition_name != parent {
                                self.report(
                                    format!(
                                        "Fragment cannot be spread here as objects of type \"{parent}\" can never be of type \"{condition_name}\"."
                                    ),
                                    &[inline.span],
                                );
                            }
                            self.visit_selection_set(&inline.selection_set, &condition_name);
                        }
                        Some(_) => self.report(
                            format!(
                                "Fragment cannot condition on non composite type \"{condition_name}\"."
                            ),
                            &[condition.span],
                        ),
                    }
                }
            }
        }
    }

    fn visit_field(&mut self, field: &FieldSelection<'_>, parent: &str) {
        self.check_directives(&field.directives, "FIELD");
        let name = self.name(field.name.value);
        let schema = self.schema;
        let Some(definition) = schema.field(parent, &name) else {
            self.report(
                format!("Cannot query field \"{name}\" on type \"{parent}\"."),
                &[field.span],
            );
            return;
        };
        let ty = &definition.ty;

        self.check_arguments(
            &field.arguments,
            &definition.arguments,
            ArgumentOwner::Field {
                parent,
                name: &name,
            },
            field.span,
        );

        let named = ty.named_type();
        match (self.schema.is_leaf_type(named), &field.selection_set) {
            (true, Some(set)) => self.report(
                format!(
                    "Field \"{name}\" must not have a selection since type \"{ty}\" has no subfields."
                ),
                &[set.span],
            ),
            (false, None) => self.report(
                format!(
                    "Field \"{name}\" of type \"{ty}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?"
                ),
                &[field.span],
            ),
            (false, Some(set)) => self.visit_selection_set(set, named),
            (true, None) => {}
        }
    }

    fn check_arguments(
        &mut self,
        arguments: &[Argument<'_>],
        definitions: &IndexMap<String, InputValueDef>,
        owner: ArgumentOwner<'_>,
        span: Span,
    ) {
        let mut seen = FxHashSet::default();
        for argument in arguments {
            let name = self.name(argument.name.value);
            if !seen.insert(argument.name.value) {
                self.report(
                    format!("There can be only one argument named \"{name}\"."),
                    &[argument.name.span],
                );
                continue;
            }
            let Some(definition) = definitions.get(&name) else {
                let message = match owner {
                    ArgumentOwner::Field { parent, name: field } => {
                        format!("Unknown argument \"{name}\" on field \"{parent}.{field}\".")
                    }
                    ArgumentOwner::Directive(directive) => {
                        format!("Unknown argument \"{name}\" on directive \"@{directive}\".")
                    }
                };
                self.report(message, &[argument.name.span]);
                self.check_value(&argument.value, None, false);
                continue;
            };
            self.check_value(
                &argument.value,
                Some(&definition.ty),
                definition.default_value.is_some(),
            );
        }

        for definition in definitions.values() {
            let provided = arguments
                .iter()
                .any(|argument| self.interner.is(argument.name.value, &definition.name));
            if provided || !definition.is_required() {
                continue;
            }
            let message = match owner {
                ArgumentOwner::Field { name: field, .. } => format!(
                    "Field \"{field}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                    definition.name, definition.ty
                ),
                ArgumentOwner::Directive(directive) => format!(
                    "Directive \"@{directive}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                    definition.name, definition.ty
                ),
            };
            self.report(message, &[span]);
        }
    }

    /// Records variable usages inside a value and checks that each variable
    /// fits the position it is used in.
    fn check_value(&mut self, value: &Value<'_>, expected: Option<&TypeRef>, has_default: bool) {
        match value {
            Value::Variable(name) => self.check_variable_usage(*name, expected, has_default),
            Value::List(items, _) => {
                let item_type = expected.and_then(|ty| match ty.nullable() {
                    TypeRef::List(inner) => Some(inner.as_ref()),
                    _ => None,
                });
                for item in items {
                    self.check_value(item, item_type, false);
                }
            }
            Value::Object(fields, _) => {
                let input = expected.and_then(|ty| match self.schema.get_type(ty.named_type()) {
                    Some(TypeDef::InputObject(def)) => Some(def.clone()),
                    _ => None,
                });
                for (name, value) in fields {
                    let field = input
                        .as_ref()
                        .and_then(|def| def.fields.get(&self.name(name.value)));
                    self.check_value(
                        value,
                        field.map(|field| &field.ty),
                        field.is_some_and(|field| field.default_value.is_some()),
                    );
                }
            }
            Value::Int(..)
            | Value::Float(..)
            | Value::String(..)
            | Value::Boolean(..)
            | Value::Null(_)
            | Value::Enum(_) => {}
        }
    }

    fn check_variable_usage(
        &mut self,
        name: Name,
        expected: Option<&TypeRef>,
        location_has_default: bool,
    ) {
        self.used_variables.insert(name.value);
        let Some(definition) = self.variables.get(&name.value).copied() else {
            let message = match self.operation.name {
                Some(op) => format!(
                    "Variable \"${}\" is not defined by operation \"{}\".",
                    self.name(name.value),
                    self.name(op.value)
                ),
                None => format!("Variable \"${}\" is not defined.", self.name(name.value)),
            };
            let spans = [name.span, self.operation.span];
            self.report(message, &spans);
            return;
        };
        let Some(expected) = expected else {
            return;
        };

        let variable_type = TypeRef::from_ast(&definition.ty, self.interner);
        let has_default = definition
            .default_value
            .as_ref()
            .is_some_and(|value| !matches!(value, Value::Null(_)));
        let allowed = variable_type.is_subtype_of(expected)
            || (expected.is_non_null()
                && !variable_type.is_non_null()
                && (has_default || location_has_default)
                && variable_type.is_subtype_of(expected.nullable()));
        if !allowed {
            let spans = [definition.name.span, name.span];
            self.report(
                format!(
                    "Variable \"${}\" of type \"{variable_type}\" used in position expecting type \"{expected}\".",
                    self.name(name.value)
                ),
                &spans,
            );
        }
    }

    /// Fields sharing a response key must be the same field with the same
    /// arguments.
    fn check_conflicts(&mut self, set: &SelectionSet<'_>) {
        let mut fields = Vec::new();
        let mut visited = FxHashSet::default();
        collect_fields(set, &self.fragments, &mut visited, &mut fields);
        let fields: Vec<(Name, Span, String)> = fields
            .into_iter()
            .map(|field| {
                (
                    field.response_key(),
                    field.span,
                    format!(
                        "{}({})",
                        self.name(field.name.value),
                        argument_signature(&field.arguments, self.interner)
                    ),
                )
            })
            .collect();

        let mut by_key: IndexMap<Text, (Span, &str)> = IndexMap::new();
        for (key, span, signature) in &fields {
            let Some((first_span, first)) = by_key.get(&key.value).copied() else {
                by_key.insert(key.value, (*span, signature));
                continue;
            };
            let (a, b) = (field_name(first), field_name(signature));
            let reason = if a != b {
                format!("\"{a}\" and \"{b}\" are different fields")
            } else if first != signature {
                "they have differing arguments".to_string()
            } else {
                continue;
            };
            let spans = [first_span, *span];
            self.report(
                format!(
                    "Fields \"{}\" conflict because {reason}. Use different aliases on the fields to fetch both if this was intentional.",
                    self.name(key.value)
                ),
                &spans,
            );
        }
    }
}

fn field_name(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature)
}

/// Collects the fields of a selection set with fragments expanded.
fn collect_fields<'d>(
    set: &'d SelectionSet<'d>,
    fragments: &FxHashMap<Text, &'d FragmentDefinition<'d>>,
    visited: &mut FxHashSet<Text>,
    out: &mut Vec<&'d FieldSelection<'d>>,
) {
    for selection in &set.selections {
        match selection {
            Selection::Field(field) => out.push(field),
            Selection::InlineFragment(inline) => {
                collect_fields(&inline.selection_set, fragments, visited, out);
            }
            Selection::FragmentSpread(spread) => {
                if let Some(fragment) = fragments.get(&spread.name.value) {
                    if visited.insert(spread.name.value) {
                        collect_fields(&fragment.selection_set, fragments, visited, out);
                    }
                }
            }
        }
    }
}

fn collect_spreads(set: &SelectionSet<'_>, out: &mut FxHashSet<Text>) {
    for selection in &set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(set) = &field.selection_set {
                    collect_spreads(set, out);
                }
            }
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, out),
            Selection::FragmentSpread(spread) => {
                out.insert(spread.name.value);
            }
        }
    }
}

/// A canonical rendering of an argument list for comparison.
fn argument_signature(arguments: &[Argument<'_>], interner: &Interner) -> String {
    let mut rendered: Vec<String> = arguments
        .iter()
        .map(|argument| {
            format!(
                "{}:{}",
                interner.get(argument.name.value),
                value_signature(&argument.value, interner)
            )
        })
        .collect();
    rendered.sort();
    rendered.join(",")
}

fn value_signature(value: &Value<'_>, interner: &Interner) -> String {
    match value {
        Value::Variable(name) => format!("${}", interner.get(name.value)),
        Value::Int(i, _) => i.to_string(),
        Value::Float(f, _) => f.to_string(),
        Value::String(s, _) => format!("{s:?}"),
        Value::Boolean(b, _) => b.to_string(),
        Value::Null(_) => "null".to_string(),
        Value::Enum(name) => interner.get(name.value),
        Value::List(items, _) => format!(
            "[{}]",
            items
                .iter()
                .map(|item| value_signature(item, interner))
                .collect::<Vec<_>>()
                .join(",")
        ),
        Value::Object(fields, _) => {
            let mut fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| {
                    format!(
                        "{}:{}",
                        interner.get(name.value),
                        value_signature(value, interner)
                    )
                })
                .collect();
            fields.sort();
            format!("{{{}}}", fields.join(","))
        }
    }
}
