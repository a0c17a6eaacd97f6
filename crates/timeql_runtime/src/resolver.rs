//! Resolver system.
//!
//! Resolvers are registered in a [`ResolverMap`] through typed
//! [`ResolverDescriptor`]s. A descriptor records the argument and return
//! types derived from Rust types so the binder can check them against the
//! schema before any request is served.

use crate::error::{PathSegment, ResolverError};
use crate::scalar::TimeScalar;
use crate::schema::TypeRef;
use crate::value::{ConstValue, Timestamp};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Arguments passed to a resolver, already coerced by the scalar codecs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverArgs {
    args: IndexMap<String, ConstValue>,
}

impl ResolverArgs {
    /// Creates new resolver args.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates resolver args from a list of (name, value) pairs.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, ConstValue)>) -> Self {
        Self {
            args: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Gets an argument by name.
    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.args.get(name)
    }

    /// Gets an argument as a specific type.
    pub fn get_as<T: InputType>(&self, name: &str) -> Option<T> {
        self.args.get(name).and_then(|v| T::from_value(v).ok())
    }

    /// Gets an argument, converting it to `T`.
    ///
    /// A missing argument converts from `null`, so it succeeds for `Option`.
    pub fn require<T: InputType>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self.args.get(name).unwrap_or(&ConstValue::Null);
        T::from_value(value)
            .map_err(|err| ResolverError::Generic(format!("Argument \"{name}\": {err}")))
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: ConstValue) {
        self.args.insert(name.into(), value);
    }

    /// Iterates over the arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConstValue)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Info about the field being resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInfo<'a> {
    /// The parent type name.
    pub parent_type: &'a str,

    /// The field name being resolved.
    pub field_name: &'a str,

    /// The declared return type.
    pub return_type: &'a TypeRef,

    /// Path to this field.
    pub path: &'a [PathSegment],
}

/// Result type for resolvers.
pub type ResolverResult = Result<ConstValue, ResolverError>;

/// Future type for async resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Trait for field resolvers.
pub trait Resolver: Send + Sync {
    /// Resolves a field value.
    fn resolve<'a>(
        &'a self,
        parent: &'a ConstValue,
        args: &'a ResolverArgs,
        info: &'a ResolverInfo<'a>,
    ) -> ResolverFuture<'a>;
}

/// A sync resolver function.
pub type SyncResolverFn =
    Arc<dyn Fn(&ConstValue, &ResolverArgs, &ResolverInfo<'_>) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    /// Creates a new function resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ConstValue, &ResolverArgs, &ResolverInfo<'_>) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a ConstValue,
        args: &'a ResolverArgs,
        info: &'a ResolverInfo<'a>,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, info);
        Box::pin(async move { result })
    }
}

/// An async resolver function type.
pub type AsyncResolverFn =
    Arc<dyn Fn(ConstValue, ResolverArgs) -> ResolverFuture<'static> + Send + Sync>;

/// A wrapper for async resolver functions.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    /// Creates a new async function resolver.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ConstValue, ResolverArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args| Box::pin(f(parent, args))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a ConstValue,
        args: &'a ResolverArgs,
        _info: &'a ResolverInfo<'a>,
    ) -> ResolverFuture<'a> {
        (self.func)(parent.clone(), args.clone())
    }
}

/// Default resolver that reads the property of the same name from the
/// parent object.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a ConstValue,
        _args: &'a ResolverArgs,
        info: &'a ResolverInfo<'a>,
    ) -> ResolverFuture<'a> {
        let result = match parent {
            ConstValue::Object(map) => Ok(map.get(info.field_name).cloned().unwrap_or_default()),
            ConstValue::Null => Ok(ConstValue::Null),
            other => Err(ResolverError::Generic(format!(
                "Cannot read field \"{}\" of {} value",
                info.field_name,
                other.kind()
            ))),
        };
        Box::pin(async move { result })
    }
}

/// A Rust type with a GraphQL type.
pub trait GraphQLType {
    fn type_ref() -> TypeRef;
}

/// A type that can be read from a coerced argument value.
pub trait InputType: GraphQLType + Sized {
    fn from_value(value: &ConstValue) -> Result<Self, String>;
}

/// A type that can be returned from a resolver.
pub trait OutputType: GraphQLType {
    fn into_value(self) -> ConstValue;
}

fn unexpected(expected: &str, value: &ConstValue) -> String {
    format!("expected {expected}, found {value}")
}

impl GraphQLType for Timestamp {
    fn type_ref() -> TypeRef {
        TypeRef::named_non_null(TimeScalar::NAME)
    }
}

impl InputType for Timestamp {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Time(time) => Ok(*time),
            ConstValue::String(s) => TimeScalar::parse(s).map_err(|err| err.message),
            other => Err(unexpected("Time", other)),
        }
    }
}

impl OutputType for Timestamp {
    fn into_value(self) -> ConstValue {
        ConstValue::Time(self)
    }
}

impl GraphQLType for String {
    fn type_ref() -> TypeRef {
        TypeRef::named_non_null("String")
    }
}

impl InputType for String {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::String(s) => Ok(s.clone()),
            other => Err(unexpected("String", other)),
        }
    }
}

impl OutputType for String {
    fn into_value(self) -> ConstValue {
        ConstValue::String(self)
    }
}

impl GraphQLType for i32 {
    fn type_ref() -> TypeRef {
        TypeRef::named_non_null("Int")
    }
}

impl InputType for i32 {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Int(i) => i32::try_from(*i).map_err(|_| unexpected("Int", value)),
            other => Err(unexpected("Int", other)),
        }
    }
}

impl OutputType for i32 {
    fn into_value(self) -> ConstValue {
        ConstValue::from(self)
    }
}

impl GraphQLType for f64 {
    fn type_ref() -> TypeRef {
        TypeRef::named_non_null("Float")
    }
}

impl InputType for f64 {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Float(f) => Ok(*f),
            ConstValue::Int(i) => Ok(*i as f64),
            other => Err(unexpected("Float", other)),
        }
    }
}

impl OutputType for f64 {
    fn into_value(self) -> ConstValue {
        ConstValue::Float(self)
    }
}

impl GraphQLType for bool {
    fn type_ref() -> TypeRef {
        TypeRef::named_non_null("Boolean")
    }
}

impl InputType for bool {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Boolean(b) => Ok(*b),
            other => Err(unexpected("Boolean", other)),
        }
    }
}

impl OutputType for bool {
    fn into_value(self) -> ConstValue {
        ConstValue::Boolean(self)
    }
}

impl<T: GraphQLType> GraphQLType for Option<T> {
    fn type_ref() -> TypeRef {
        T::type_ref().nullable().clone()
    }
}

impl<T: InputType> InputType for Option<T> {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: OutputType> OutputType for Option<T> {
    fn into_value(self) -> ConstValue {
        self.map_or(ConstValue::Null, OutputType::into_value)
    }
}

impl<T: GraphQLType> GraphQLType for Vec<T> {
    fn type_ref() -> TypeRef {
        TypeRef::list(T::type_ref()).non_null()
    }
}

impl<T: InputType> InputType for Vec<T> {
    fn from_value(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::List(items) => items.iter().map(T::from_value).collect(),
            other => T::from_value(other).map(|item| vec![item]),
        }
    }
}

impl<T: OutputType> OutputType for Vec<T> {
    fn into_value(self) -> ConstValue {
        ConstValue::List(self.into_iter().map(OutputType::into_value).collect())
    }
}

/// A registered field resolver with its declared signature.
#[derive(Clone)]
pub struct ResolverDescriptor {
    pub field: String,
    pub arguments: IndexMap<String, TypeRef>,
    pub return_type: TypeRef,
    resolver: Arc<dyn Resolver>,
}

impl ResolverDescriptor {
    /// Starts describing a resolver for the named field.
    pub fn field(name: impl Into<String>) -> ResolverDescriptorBuilder {
        ResolverDescriptorBuilder {
            field: name.into(),
            arguments: IndexMap::new(),
        }
    }

    /// Returns the resolver.
    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }
}

impl Debug for ResolverDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverDescriptor")
            .field("field", &self.field)
            .field("arguments", &self.arguments)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`ResolverDescriptor::field`].
#[derive(Debug)]
pub struct ResolverDescriptorBuilder {
    field: String,
    arguments: IndexMap<String, TypeRef>,
}

impl ResolverDescriptorBuilder {
    /// Declares an argument typed by `T`.
    #[must_use]
    pub fn argument<T: InputType>(self, name: impl Into<String>) -> Self {
        self.argument_type(name, T::type_ref())
    }

    /// Declares an argument with an explicit type.
    #[must_use]
    pub fn argument_type(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.arguments.insert(name.into(), ty);
        self
    }

    /// Finishes with a synchronous handler.
    pub fn sync<R, F>(self, f: F) -> ResolverDescriptor
    where
        R: OutputType,
        F: Fn(&ResolverArgs) -> Result<R, ResolverError> + Send + Sync + 'static,
    {
        let resolver =
            FnResolver::new(move |_parent, args, _info| f(args).map(OutputType::into_value));
        self.resolver(R::type_ref(), resolver)
    }

    /// Finishes with an asynchronous handler.
    pub fn asynchronous<R, F, Fut>(self, f: F) -> ResolverDescriptor
    where
        R: OutputType + 'static,
        F: Fn(ResolverArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ResolverError>> + Send + 'static,
    {
        let resolver = AsyncFnResolver::new(move |_parent, args| {
            let future = f(args);
            async move { future.await.map(OutputType::into_value) }
        });
        self.resolver(R::type_ref(), resolver)
    }

    /// Finishes with an untyped resolver and an explicit return type.
    pub fn resolver<R: Resolver + 'static>(
        self,
        return_type: TypeRef,
        resolver: R,
    ) -> ResolverDescriptor {
        ResolverDescriptor {
            field: self.field,
            arguments: self.arguments,
            return_type,
            resolver: Arc::new(resolver),
        }
    }
}

/// Storage for resolvers organized by type and field.
#[derive(Default, Clone)]
pub struct ResolverMap {
    /// Resolvers indexed by "TypeName.fieldName".
    resolvers: IndexMap<String, ResolverDescriptor>,

    /// Keys registered more than once.
    duplicates: Vec<String>,
}

impl ResolverMap {
    /// Creates a new resolver map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolver for a field of a type.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        descriptor: ResolverDescriptor,
    ) -> &mut Self {
        let key = format!("{}.{}", type_name.into(), descriptor.field);
        if self.resolvers.insert(key.clone(), descriptor).is_some() {
            self.duplicates.push(key);
        }
        self
    }

    /// Gets the resolver for a type and field.
    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&ResolverDescriptor> {
        self.resolvers.get(&format!("{type_name}.{field_name}"))
    }

    /// Iterates over `(type name, descriptor)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolverDescriptor)> {
        self.resolvers.iter().map(|(key, descriptor)| {
            let type_name = key
                .strip_suffix(descriptor.field.as_str())
                .and_then(|prefix| prefix.strip_suffix('.'))
                .unwrap_or(key);
            (type_name, descriptor)
        })
    }

    /// Keys ("Type.field") that were registered more than once.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .field("duplicates", &self.duplicates)
            .finish()
    }
}
