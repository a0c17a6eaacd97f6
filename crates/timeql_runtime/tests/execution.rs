//! End-to-end execution through the public API.

use chrono::{DateTime, Utc};
use serde_json::json;
use timeql_runtime::{
    ConstValue, DomainError, Executor, FnResolver, Request, ResolverDescriptor, ResolverError,
    ResolverMap, SchemaBinder, TimeScalar, Timestamp, TypeRef,
};

const SDL: &str = r#"
scalar Time

type Event {
  name: String!
  at: Time!
}

type Query {
  today: Time!
  distanceOfTimeToNowInWords(from: Time!): String!
  testError: String
  events: [Event!]!
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
            .sync(|args| {
                let from: Timestamp = args.require("from")?;
                let seconds = (Utc::now().fixed_offset() - from).num_seconds();
                Ok(format!("{seconds} seconds"))
            }),
    )
    .register(
        "Query",
        ResolverDescriptor::field("testError").asynchronous(|_| async {
            Err::<Option<String>, _>(ResolverError::from(DomainError::new(
                "NotFound",
                "This is not the droid you are looking for",
            )))
        }),
    )
    .register(
        "Query",
        ResolverDescriptor::field("events").resolver(
            TypeRef::list(TypeRef::named_non_null("Event")).non_null(),
            FnResolver::new(|_, _, _| {
                Ok(ConstValue::List(vec![ConstValue::object([
                    ("name", ConstValue::from("epoch")),
                    (
                        "at",
                        ConstValue::Time(DateTime::<Utc>::UNIX_EPOCH.fixed_offset()),
                    ),
                ])]))
            }),
        ),
    );
    map
}

fn executor() -> Executor {
    let bound = SchemaBinder::new(SDL)
        .codec(TimeScalar)
        .resolvers(resolvers())
        .bind()
        .unwrap();
    Executor::new(bound)
}

async fn run(request: Request) -> serde_json::Value {
    executor().execute(request).await.to_json()
}

fn seconds(words: &serde_json::Value) -> i64 {
    words
        .as_str()
        .and_then(|s| s.strip_suffix(" seconds"))
        .and_then(|n| n.parse().ok())
        .unwrap()
}

#[tokio::test]
async fn test_today_is_now() {
    let response = run(Request::new("{ today }")).await;
    let today = TimeScalar::parse(response["data"]["today"].as_str().unwrap()).unwrap();
    let drift = (Utc::now().fixed_offset() - today).num_seconds().abs();
    assert!(drift <= 2, "drift of {drift}s");
    assert!(response.get("errors").is_none());
}

#[tokio::test]
async fn test_distance_from_epoch() {
    let response = run(Request::new(
        r#"{ distanceOfTimeToNowInWords(from: "1970-01-01T00:00:00Z") }"#,
    ))
    .await;
    let elapsed = seconds(&response["data"]["distanceOfTimeToNowInWords"]);
    let expected = Utc::now().timestamp();
    assert!((expected - elapsed).abs() <= 2);
}

#[tokio::test]
async fn test_distance_to_the_future_is_negative() {
    let future = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
    let response = run(
        Request::new("query D($from: Time!) { distanceOfTimeToNowInWords(from: $from) }")
            .variable("from", json!(future)),
    )
    .await;
    let elapsed = seconds(&response["data"]["distanceOfTimeToNowInWords"]);
    assert!((-3600..=-3598).contains(&elapsed), "{elapsed}");
}

#[tokio::test]
async fn test_error_envelope() {
    let response = run(Request::new("{ testError }")).await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "testError": null
      },
      "errors": [
        {
          "message": "This is not the droid you are looking for",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "testError"
          ],
          "extensions": {
            "code": "NotFound",
            "message": "This is not the droid you are looking for"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn test_partial_success() {
    let response = run(Request::new("{ testError events { name at } }")).await;
    assert_eq!(
        response["data"],
        json!({
            "testError": null,
            "events": [{"name": "epoch", "at": "1970-01-01T00:00:00Z"}]
        })
    );
    assert_eq!(response["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_time_literal_is_a_field_error() {
    let response = run(Request::new(
        r#"{ testError distanceOfTimeToNowInWords(from: "last tuesday") }"#,
    ))
    .await;
    assert_eq!(response["data"], serde_json::Value::Null);
    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[1]["path"], json!(["distanceOfTimeToNowInWords"]));
    assert_eq!(errors[1]["locations"], json!([{"line": 1, "column": 13}]));
    assert!(errors[1]["message"]
        .as_str()
        .unwrap()
        .contains("Time cannot represent value"));
}

#[tokio::test]
async fn test_malformed_time_variable_is_a_request_error() {
    let response = run(
        Request::new("query ($from: Time!) { distanceOfTimeToNowInWords(from: $from) }")
            .variable("from", json!("last tuesday")),
    )
    .await;
    assert!(response.get("data").is_none());
    let message = response["errors"][0]["message"].as_str().unwrap();
    assert!(message.starts_with("Variable \"$from\" got invalid value \"last tuesday\""));
    assert_eq!(response["errors"][0]["locations"], json!([{"line": 1, "column": 8}]));
}

#[tokio::test]
async fn test_unix_seconds_variable() {
    let response = run(
        Request::new("query ($from: Time!) { distanceOfTimeToNowInWords(from: $from) }")
            .variable("from", json!(0)),
    )
    .await;
    let elapsed = seconds(&response["data"]["distanceOfTimeToNowInWords"]);
    assert!((Utc::now().timestamp() - elapsed).abs() <= 2);
}

#[tokio::test]
async fn test_syntax_error() {
    let response = run(Request::new("{ today")).await;
    assert!(response.get("data").is_none());
    let error = &response["errors"][0];
    assert!(error["message"].as_str().unwrap().starts_with("Syntax Error: "));
    assert_eq!(error["locations"][0]["line"], 1);
}

#[tokio::test]
async fn test_bad_escape_before_multibyte_text() {
    let query = r#"{ distanceOfTimeToNowInWords(from: "\uaéé") }"#;
    let response = tokio::spawn(run(Request::new(query))).await.unwrap();
    assert!(response.get("data").is_none());
    assert_eq!(
        response["errors"][0]["message"],
        "Syntax Error: invalid escape sequence `\\uaéé`"
    );
}

#[tokio::test]
async fn test_deeply_nested_query() {
    let lists = format!(
        "{{ distanceOfTimeToNowInWords(from: {}) }}",
        "[".repeat(20_000)
    );
    let selections = format!("{}{}", "{ events ".repeat(20_000), "}".repeat(20_000));
    for query in [lists, selections] {
        let response = tokio::spawn(run(Request::new(query))).await.unwrap();
        assert!(response.get("data").is_none());
        assert_eq!(response["errors"].as_array().unwrap().len(), 1);
        assert_eq!(
            response["errors"][0]["message"],
            "Syntax Error: document is nested more than 128 levels deep"
        );
    }

    // Within the limit, nesting reaches validation.
    let query = format!("{}{}", "{ events ".repeat(100), "}".repeat(100));
    let response = run(Request::new(query)).await;
    assert_eq!(
        response["errors"][0]["message"],
        "Cannot query field \"events\" on type \"Event\"."
    );
}

#[tokio::test]
async fn test_validation_error() {
    let response = run(Request::new("{ yesterday }")).await;
    assert_eq!(
        response,
        json!({
            "errors": [{
                "message": "Cannot query field \"yesterday\" on type \"Query\".",
                "locations": [{"line": 1, "column": 3}]
            }]
        })
    );
}

#[tokio::test]
async fn test_aliases_fragments_and_directives() {
    let response = run(Request::new(
        r#"
        query Q($withEvents: Boolean = true) {
          now: today
          ...Errors @skip(if: true)
          events @include(if: $withEvents) { ...EventFields }
          __typename
        }
        fragment Errors on Query { testError }
        fragment EventFields on Event { label: name }
        "#,
    ))
    .await;
    assert!(response.get("errors").is_none(), "{response}");
    let data = &response["data"];
    assert_eq!(
        data.as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["now", "events", "__typename"]
    );
    assert_eq!(data["events"], json!([{"label": "epoch"}]));
    assert_eq!(data["__typename"], "Query");
}

#[tokio::test]
async fn test_introspection() {
    let response = run(Request::new(
        r#"
        {
          __schema { queryType { name } }
          __type(name: "Time") { kind name }
          query: __type(name: "Query") {
            fields { name type { kind ofType { name } } }
          }
        }
        "#,
    ))
    .await;
    let data = &response["data"];
    assert_eq!(data["__schema"]["queryType"]["name"], "Query");
    assert_eq!(data["__type"], json!({"kind": "SCALAR", "name": "Time"}));
    assert_eq!(
        data["query"]["fields"][0],
        json!({"name": "today", "type": {"kind": "NON_NULL", "ofType": {"name": "Time"}}})
    );
}

#[tokio::test]
async fn test_concurrent_requests_share_executor() {
    let executor = executor();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let executor = executor.clone();
            tokio::spawn(async move { executor.execute(Request::new("{ today }")).await })
        })
        .collect();
    for handle in handles {
        assert!(!handle.await.unwrap().has_errors());
    }
}
