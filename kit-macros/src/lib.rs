//! Procedural macros for the Kit framework
//!
//! This crate provides:
//! - `#[injectable]` constructor declarations for auto-wiring
//! - `#[service]` trait bounds, default implementations and fakes

use proc_macro::TokenStream;

mod injectable;
mod service;

/// Declare a struct's constructor so the container can build it unbound
///
/// Fields marked `#[inject]` become constructor parameters; the rest use
/// `Default::default()`.
///
/// # Example
///
/// ```rust,ignore
/// use kit::injectable;
///
/// #[injectable]
/// pub struct UserRepository {
///     #[inject]
///     logger: Arc<Logger>,
///     #[inject(key = "db.connection")]
///     connection: Arc<Connection>,
///     #[inject(default = 50)]
///     page_size: usize,
/// }
///
/// // Middleware can be marked so it resolves by key
/// #[injectable(middleware)]
/// pub struct Authenticate {
///     #[inject]
///     guard: Arc<dyn Guard>,
/// }
/// ```
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, input: TokenStream) -> TokenStream {
    injectable::injectable_impl(attr, input)
}

/// Mark a trait as a container service
///
/// Adds `Send + Sync + 'static` bounds, and optionally declares the default
/// implementation and a test fake.
///
/// # Example
///
/// ```rust,ignore
/// use kit::service;
///
/// #[service(impl = SmtpTransport, fake = FakeTransport)]
/// pub trait Transport {
///     fn send(&self, to: &str, body: &str) -> Result<(), BoxError>;
/// }
/// ```
#[proc_macro_attribute]
pub fn service(attr: TokenStream, input: TokenStream) -> TokenStream {
    service::service_impl(attr, input)
}
