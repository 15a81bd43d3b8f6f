//! Request destinations for the demo pipeline

use crate::services::ReportService;
use kit::{Container, HttpResponse, Request, Response};

pub fn dispatch(container: &Container, request: Request) -> Response {
    match request.path() {
        "/" => HttpResponse::json(serde_json::json!({ "message": "Welcome to Kit!" })).ok(),
        "/admin/reports" => {
            let reports = container.make_as::<ReportService>("reports")?;
            HttpResponse::text(reports.summary("admin")).ok()
        }
        path => Err(format!("no route for [{}]", path).into()),
    }
}
