//! The resolvers of the root query type.

use chrono::Utc;
use timeql_runtime::{DomainError, ResolverDescriptor, ResolverError, ResolverMap, Timestamp};

/// Domain error code returned by `testError`.
pub const NOT_FOUND: &str = "NotFound";

/// Current wall-clock time in UTC.
pub fn today() -> Timestamp {
    Utc::now().fixed_offset()
}

/// Renders the whole seconds from `from` to `now`, truncated toward zero.
/// Timestamps after `now` give negative counts.
pub fn distance_in_words(from: &Timestamp, now: &Timestamp) -> String {
    let seconds = now.signed_duration_since(*from).num_seconds();
    format!("{seconds} second(s)")
}

pub fn test_error() -> DomainError {
    DomainError::new(NOT_FOUND, "This is not the droid you are looking for")
}

/// Builds the resolver set for [`crate::SCHEMA`].
pub fn resolvers() -> ResolverMap {
    let mut map = ResolverMap::new();
    map.register("Query", ResolverDescriptor::field("today").sync(|_| Ok(today())))
        .register(
            "Query",
            ResolverDescriptor::field("distanceOfTimeToNowInWords")
                .argument::<Timestamp>("from")
                .sync(|args| {
                    let from: Timestamp = args.require("from")?;
                    Ok(distance_in_words(&from, &today()))
                }),
        )
        .register(
            "Query",
            ResolverDescriptor::field("testError")
                .sync(|_| Err::<Option<String>, _>(ResolverError::from(test_error()))),
        );
    map
}
