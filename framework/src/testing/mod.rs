//! Testing utilities for Kit framework
//!
//! - `TestContainer` swaps container entries for the life of a guard
//! - `MemoryHandler` captures log records for assertions
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::testing::{MemoryHandler, TestContainer};
//!
//! #[test]
//! fn test_signup_sends_welcome_mail() {
//!     let container = bootstrap::container().unwrap();
//!     let mailer = Arc::new(FakeMailer::default());
//!     let _guard = TestContainer::fake_type::<dyn Mailer>(&container, mailer.clone());
//!
//!     signup(&container, "ada@example.com").unwrap();
//!     assert_eq!(mailer.sent(), 1);
//! }
//! ```

pub use crate::container::testing::{TestContainer, TestContainerGuard};
pub use crate::logging::MemoryHandler;
