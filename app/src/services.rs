//! Application services
//!
//! `Greeter` resolves to `PoliteGreeter` without any registration; tests can
//! swap it with `<dyn Greeter>::fake(&container)`.

use kit::logging::Logger;
use kit::{injectable, service};
use std::sync::Arc;

#[service(impl = PoliteGreeter, fake = FakeGreeter)]
pub trait Greeter {
    fn greet(&self, name: &str) -> String;
}

#[injectable]
pub struct PoliteGreeter {
    #[inject(default = "Hello".to_string())]
    salutation: String,
}

impl Greeter for PoliteGreeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.salutation, name)
    }
}

#[derive(Default)]
pub struct FakeGreeter;

impl Greeter for FakeGreeter {
    fn greet(&self, name: &str) -> String {
        format!("fake greeting for {}", name)
    }
}

/// Monthly report builder, wired by the container
#[injectable]
pub struct ReportService {
    #[inject]
    greeter: Arc<dyn Greeter>,
    #[inject]
    logger: Arc<Logger>,
    #[inject(default = 10)]
    page_size: usize,
}

impl ReportService {
    pub fn summary(&self, user: &str) -> String {
        self.logger.info(
            "building report",
            serde_json::json!({ "user": user, "page_size": self.page_size }),
        );
        format!("{} You have {} reports per page.", self.greeter.greet(user), self.page_size)
    }
}
