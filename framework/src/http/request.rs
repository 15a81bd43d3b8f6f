use bytes::Bytes;
use std::collections::HashMap;

/// HTTP Request wrapper providing Laravel-like access to request data
///
/// Middleware predicates only rely on `path()` and `method()`; everything else
/// is for the middleware and handlers themselves.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Bytes>,
    params: HashMap<String, String>,
}

impl Request {
    pub fn new(inner: http::Request<Bytes>) -> Self {
        Self {
            inner,
            params: HashMap::new(),
        }
    }

    /// Build a bodiless request for the given method and URI
    ///
    /// # Example
    ///
    /// ```rust
    /// use kit::Request;
    ///
    /// let request = Request::build("GET", "/admin/users?page=2").unwrap();
    /// assert_eq!(request.path(), "/admin/users");
    /// ```
    pub fn build(method: &str, uri: &str) -> Result<Self, http::Error> {
        let inner = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())?;
        Ok(Self::new(inner))
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Get the request method
    pub fn method(&self) -> &http::Method {
        self.inner.method()
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    /// Get a route parameter by name (e.g., /users/{id})
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get all route parameters
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Get the inner http request
    pub fn inner(&self) -> &http::Request<Bytes> {
        &self.inner
    }

    /// Get a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing any previous value
    pub fn set_header(&mut self, name: &'static str, value: &str) -> Result<(), http::Error> {
        let value = http::HeaderValue::from_str(value).map_err(http::Error::from)?;
        self.inner.headers_mut().insert(name, value);
        Ok(())
    }

    /// Get the Content-Type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the raw request body
    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    /// Get a value a previous middleware attached to this request
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.extensions().get::<T>()
    }

    /// Attach a value for later middleware and the handler
    pub fn insert_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.inner.extensions_mut().insert(value)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(inner: http::Request<Bytes>) -> Self {
        Self::new(inner)
    }
}
