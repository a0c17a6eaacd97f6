//! Shared fixture for the runtime's unit tests.

use crate::binder::{BoundSchema, SchemaBinder};
use crate::error::{DomainError, ResolverError};
use crate::resolver::{FnResolver, ResolverDescriptor, ResolverMap};
use crate::scalar::TimeScalar;
use crate::schema::TypeRef;
use crate::value::{ConstValue, Timestamp};
use chrono::{DateTime, Utc};

pub(crate) const SDL: &str = r#"
"A point in time, encoded as RFC 3339."
scalar Time

enum Unit { SECONDS MINUTES }

input Window {
  from: Time!
  unit: Unit = SECONDS
}

type Clock {
  now: Time!
  zone: String
  offsets: [Int!]
}

type Query {
  today: Time!
  distanceOfTimeToNowInWords(from: Time!): String!
  testError: String
  clock: Clock
  broken: Clock
  clocks: [Clock!]!
  span(window: Window!): Int
  maybe(from: Time): String
}
"#;

pub(crate) fn epoch() -> Timestamp {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

fn clock(now: ConstValue) -> ConstValue {
    ConstValue::object([
        ("now", now),
        ("zone", ConstValue::from("UTC")),
        (
            "offsets",
            ConstValue::List(vec![ConstValue::Int(0), ConstValue::Int(60)]),
        ),
    ])
}

pub(crate) fn resolvers() -> ResolverMap {
    let mut map = ResolverMap::new();
    map.register(
        "Query",
        ResolverDescriptor::field("today").sync(|_| Ok(Utc::now().fixed_offset())),
    )
    .register(
        "Query",
        ResolverDescriptor::field("distanceOfTimeToNowInWords")
            .argument::<Timestamp>("from")
            .sync(|args| {
                let from: Timestamp = args.require("from")?;
                Ok(format!("{} seconds", from.timestamp()))
            }),
    )
    .register(
        "Query",
        ResolverDescriptor::field("testError").sync(|_| {
            Err::<Option<String>, _>(ResolverError::from(DomainError::new(
                "NotFound",
                "This is not the droid you are looking for",
            )))
        }),
    )
    .register(
        "Query",
        ResolverDescriptor::field("clock").resolver(
            TypeRef::named("Clock"),
            FnResolver::new(|_, _, _| Ok(clock(ConstValue::Time(epoch())))),
        ),
    )
    .register(
        "Query",
        ResolverDescriptor::field("broken").resolver(
            TypeRef::named("Clock"),
            FnResolver::new(|_, _, _| Ok(clock(ConstValue::Null))),
        ),
    )
    .register(
        "Query",
        ResolverDescriptor::field("clocks").resolver(
            TypeRef::list(TypeRef::named_non_null("Clock")).non_null(),
            FnResolver::new(|_, _, _| Ok(ConstValue::List(vec![clock(ConstValue::Time(epoch()))]))),
        ),
    )
    .register(
        "Query",
        ResolverDescriptor::field("span")
            .argument_type("window", TypeRef::named_non_null("Window"))
            .resolver(
                TypeRef::named("Int"),
                FnResolver::new(|_, args, _| {
                    let window = args.get("window").cloned().unwrap_or_default();
                    let seconds = match window.get("unit").and_then(ConstValue::as_str) {
                        Some("MINUTES") => 60,
                        _ => 1,
                    };
                    Ok(ConstValue::Int(seconds))
                }),
            ),
    )
    .register(
        "Query",
        ResolverDescriptor::field("maybe")
            .argument::<Option<Timestamp>>("from")
            .sync(|args| {
                let from: Option<Timestamp> = args.require("from")?;
                Ok(from.map_or_else(|| "none".to_string(), |from| from.to_rfc3339()))
            }),
    );
    map
}

pub(crate) fn bound_schema() -> BoundSchema {
    SchemaBinder::new(SDL)
        .codec(TimeScalar)
        .resolvers(resolvers())
        .bind()
        .unwrap()
}
