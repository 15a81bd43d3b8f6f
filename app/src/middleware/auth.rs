//! Bearer-token authentication middleware

use kit::logging::Logger;
use kit::{injectable, HttpResponse, Middleware, Next, Request, Response};
use std::sync::Arc;

/// Rejects requests without a bearer token
///
/// Used as `auth` or `auth:<role>`; the role is checked against the
/// `x-role` header.
#[injectable(middleware)]
pub struct AuthMiddleware {
    #[inject]
    logger: Arc<Logger>,
}

impl AuthMiddleware {
    fn deny(&self, request: &Request, reason: &str) -> Response {
        self.logger.warning(
            "request rejected",
            serde_json::json!({ "path": request.path(), "reason": reason }),
        );
        HttpResponse::json(serde_json::json!({ "error": reason }))
            .status(401)
            .ok()
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, request: Request, next: Next<'_>) -> Response {
        self.handle_with_params(request, next, &[])
    }

    fn handle_with_params(&self, request: Request, next: Next<'_>, params: &[String]) -> Response {
        let Some(token) = request.header("authorization") else {
            return self.deny(&request, "missing token");
        };
        if !token.starts_with("Bearer ") {
            return self.deny(&request, "malformed token");
        }
        if let Some(role) = params.first() {
            if request.header("x-role") != Some(role.as_str()) {
                return self.deny(&request, "insufficient role");
            }
        }
        next(request)
    }
}
