//! Request logging middleware

use kit::{Middleware, Next, Request, Response};
use std::time::Instant;

/// Logs every request with its status and duration
#[derive(Default)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle(&self, request: Request, next: Next<'_>) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();
        let started = Instant::now();

        let response = next(request);
        match &response {
            Ok(response) => tracing::info!(
                %method,
                %path,
                status = response.status_code(),
                elapsed = ?started.elapsed(),
                "request handled"
            ),
            Err(err) => tracing::warn!(%method, %path, error = %err, "request failed"),
        }
        response
    }
}
