//! Runtime for timeql.
//!
//! This crate provides the GraphQL execution runtime:
//! - `value`: Runtime values passed to and from resolvers
//! - `scalar`: Scalar codecs, including the `Time` scalar
//! - `schema`: Schema model and SDL lowering
//! - `resolver`: Resolver trait, typed descriptors and the resolver map
//! - `binder`: Validation of a schema against resolvers and codecs
//! - `executor`: Query execution
//! - `introspection`: `__schema`, `__type` and `__typename`
//! - `validation`: Checks of an executable document against the schema
//! - `error`: Resolver, request and response errors
//! - `response`: Request and response envelopes

pub mod binder;
pub mod error;
pub mod executor;
pub mod introspection;
pub mod resolver;
pub mod response;
pub mod scalar;
pub mod schema;
pub mod value;

mod validation;

#[cfg(test)]
mod testing;

pub use binder::{BindError, BindIssue, BoundSchema, SchemaBinder};
pub use error::{DomainError, GraphQLError, PathSegment, RequestError, ResolverError};
pub use executor::Executor;
pub use resolver::{
    AsyncFnResolver, DefaultResolver, FnResolver, GraphQLType, InputType, OutputType, Resolver,
    ResolverArgs, ResolverDescriptor, ResolverDescriptorBuilder, ResolverFuture, ResolverInfo,
    ResolverMap, ResolverResult,
};
pub use response::{Request, Response};
pub use scalar::{ScalarCodec, ScalarError, ScalarRegistry, TimeScalar};
pub use schema::{Schema, SchemaBuilder, TypeDef, TypeRef};
pub use value::{ConstValue, Timestamp};
