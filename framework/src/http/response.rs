use crate::error::{BoxError, FrameworkError};
use bytes::Bytes;

/// HTTP Response builder providing Laravel-like response creation
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

/// Result of a middleware or destination handler - allows using `?` on any error
pub type Response = Result<HttpResponse, BoxError>;

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: Vec::new(),
        }
    }

    /// Create a response with a string body
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        }
    }

    /// Create a JSON response from a serde_json::Value
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    /// Set the HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header to the response
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Wrap this response in Ok() for use as Response type
    pub fn ok(self) -> Response {
        Ok(self)
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with the given name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert to an `http` crate response
    pub fn into_http(self) -> Result<http::Response<Bytes>, http::Error> {
        let mut builder = http::Response::builder().status(self.status);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        builder.body(Bytes::from(self.body))
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a framework error as a JSON error response
///
/// Lets the outermost caller of a pipeline turn any failure into a response.
impl From<&FrameworkError> for HttpResponse {
    fn from(err: &FrameworkError) -> HttpResponse {
        let mut body = serde_json::json!({ "error": err.to_string() });
        if let Some(name) = err.middleware_name() {
            body["middleware"] = serde_json::Value::from(name);
        }
        HttpResponse::json(body).status(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_http_keeps_status_and_headers() {
        let response = HttpResponse::text("created")
            .status(201)
            .header("X-Trace", "abc")
            .into_http()
            .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert_eq!(response.body().as_ref(), b"created");
    }

    #[test]
    fn test_error_response_names_middleware() {
        let err = FrameworkError::middleware("auth", "token expired".into());
        let response = HttpResponse::from(&err);

        assert_eq!(response.status_code(), 500);
        assert_eq!(response.get_header("content-type"), Some("application/json"));
        assert!(response.body().contains("\"middleware\":\"auth\""));
    }
}
