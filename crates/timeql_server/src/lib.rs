//! HTTP server for timeql.
//!
//! Binds the built-in schema against the resolver set and serves it over
//! HTTP/1.1 with a permissive CORS policy.
//!
//! ```no_run
//! use timeql_server::{bind_schema, Server, ServerConfig, SCHEMA};
//!
//! # async fn run() -> Result<(), timeql_server::ServerError> {
//! let bound = bind_schema(SCHEMA)?;
//! Server::new(ServerConfig::new().port(8080), bound).run().await
//! # }
//! ```

pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod resolvers;

pub use config::ServerConfig;
pub use cors::CorsConfig;
pub use error::{ErrorCode, ServerError, ServerResult};
pub use http::Server;

use timeql_runtime::{BindError, BoundSchema, SchemaBinder, TimeScalar};

/// The schema served by default.
pub const SCHEMA: &str = include_str!("schema.graphql");

/// Binds `sdl` against the resolver set and the `Time` codec.
pub fn bind_schema(sdl: &str) -> Result<BoundSchema, BindError> {
    SchemaBinder::new(sdl)
        .codec(TimeScalar)
        .resolvers(resolvers::resolvers())
        .bind()
}
