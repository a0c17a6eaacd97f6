//! Cross-origin resource sharing.

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, VARY,
};
use hyper::Method;
use std::time::Duration;

/// CORS policy applied to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Allowed origins. `*` allows any origin.
    pub origins: Vec<String>,
    pub methods: Vec<Method>,
    pub request_headers: Vec<String>,
    pub credentials: bool,
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CorsConfig {
    /// Any origin, with credentials.
    pub fn permissive() -> Self {
        Self {
            origins: vec!["*".to_string()],
            methods: vec![Method::GET, Method::PUT, Method::POST, Method::DELETE],
            request_headers: ["Origin", "Authorization", "Content-Type"]
                .map(String::from)
                .to_vec(),
            credentials: true,
            max_age: Duration::from_secs(50),
        }
    }

    /// Restricts the allowed origins.
    #[must_use]
    pub fn origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins = origins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: bool) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    fn allows_any_origin(&self) -> bool {
        self.origins.iter().any(|origin| origin == "*")
    }

    /// The `Access-Control-Allow-Origin` value for a request.
    ///
    /// A wildcard policy with credentials echoes the request origin, since
    /// browsers reject `*` on credentialed requests.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match origin {
            Some(origin) if self.allows_any_origin() && self.credentials => Some(origin.clone()),
            None if self.allows_any_origin() => Some(HeaderValue::from_static("*")),
            Some(_) if self.allows_any_origin() => Some(HeaderValue::from_static("*")),
            Some(origin) => self
                .origins
                .iter()
                .any(|allowed| origin.as_bytes() == allowed.as_bytes())
                .then(|| origin.clone()),
            None => None,
        }
    }

    /// Adds the headers every response carries.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        let Some(allowed) = self.allow_origin(origin) else {
            return;
        };
        if allowed != "*" {
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        if self.credentials {
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }

    /// Adds the headers of a preflight response.
    pub fn apply_preflight(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        self.apply(headers, origin);
        let methods = self
            .methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&methods) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.request_headers.join(", ")) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
        headers.insert(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from(self.max_age.as_secs()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echoes_origin_with_credentials() {
        let cors = CorsConfig::permissive();
        let origin = HeaderValue::from_static("https://example.com");
        let mut headers = HeaderMap::new();
        cors.apply(&mut headers, Some(&origin));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[VARY], "Origin");
    }

    #[test]
    fn test_wildcard_without_origin() {
        let mut headers = HeaderMap::new();
        CorsConfig::permissive().apply(&mut headers, None);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(VARY).is_none());
    }

    #[test]
    fn test_wildcard_without_credentials() {
        let cors = CorsConfig::permissive().credentials(false);
        let origin = HeaderValue::from_static("https://example.com");
        let mut headers = HeaderMap::new();
        cors.apply(&mut headers, Some(&origin));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[test]
    fn test_origin_list() {
        let cors = CorsConfig::permissive().origins(["https://a.test"]);
        let allowed = HeaderValue::from_static("https://a.test");
        let denied = HeaderValue::from_static("https://b.test");
        assert_eq!(cors.allow_origin(Some(&allowed)), Some(allowed.clone()));
        assert_eq!(cors.allow_origin(Some(&denied)), None);
        assert_eq!(cors.allow_origin(None), None);
    }

    #[test]
    fn test_preflight_headers() {
        let mut headers = HeaderMap::new();
        CorsConfig::permissive().apply_preflight(&mut headers, None);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, PUT, POST, DELETE");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            "Origin, Authorization, Content-Type"
        );
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "50");
    }
}
