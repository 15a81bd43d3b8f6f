use kit::container::{key_of, Concrete, Parameters};
use kit::{
    injectable, service, Container, FrameworkError, HttpResponse, Middleware,
    MiddlewareRegistry, Next, Request, Response,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[service(impl = ConsoleLogger, fake = SilentLogger)]
pub trait Logger {
    fn write(&self, line: &str) -> String;
}

#[injectable]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn write(&self, line: &str) -> String {
        format!("console: {line}")
    }
}

#[injectable]
pub struct FileLogger {
    #[inject(default = "storage/app.log".to_string())]
    path: String,
}

impl Logger for FileLogger {
    fn write(&self, line: &str) -> String {
        format!("{}: {line}", self.path)
    }
}

#[derive(Default)]
pub struct SilentLogger;

impl Logger for SilentLogger {
    fn write(&self, _: &str) -> String {
        String::new()
    }
}

#[injectable]
pub struct Reports {
    #[inject]
    logger: Arc<dyn Logger>,
    #[inject(default = 25)]
    pages: usize,
    runs: Mutex<u32>,
}

#[injectable]
pub struct Billing {
    #[inject]
    logger: Arc<dyn Logger>,
}

#[injectable]
pub struct Chicken {
    #[inject]
    egg: Arc<Egg>,
}

#[injectable]
pub struct Egg {
    #[inject]
    chicken: Arc<Chicken>,
}

#[test]
fn test_injectable_is_built_without_a_binding() {
    let container = Container::new();

    let reports = container.make_type::<Reports>().unwrap();

    assert_eq!(reports.pages, 25);
    assert_eq!(*reports.runs.lock(), 0);
    assert_eq!(reports.logger.write("ready"), "console: ready");
}

#[test]
fn test_overrides_replace_declared_defaults() {
    let container = Container::new();

    let reports = container
        .make_with(&key_of::<Reports>(), Parameters::new().with("pages", 5usize))
        .unwrap()
        .downcast::<Reports>()
        .unwrap();

    assert_eq!(reports.pages, 5);
}

#[test]
fn test_contextual_binding_only_reaches_its_consumer() {
    let container = Container::new();
    container
        .when(key_of::<Reports>())
        .needs(key_of::<dyn Logger>())
        .give(Concrete::class_as::<FileLogger, dyn Logger>(|logger| logger));
    container
        .when(key_of::<Reports>())
        .needs("$pages")
        .give(Concrete::value(100usize));

    let reports = container.make_type::<Reports>().unwrap();
    let billing = container.make_type::<Billing>().unwrap();

    assert_eq!(reports.logger.write("x"), "storage/app.log: x");
    assert_eq!(reports.pages, 100);
    assert_eq!(billing.logger.write("x"), "console: x");
}

#[test]
fn test_singleton_of_injectable_class() {
    let container = Container::new();
    container.singleton(key_of::<Reports>(), Concrete::class_of::<Reports>());

    let first = container.make_type::<Reports>().unwrap();
    *first.runs.lock() += 1;
    let second = container.make_type::<Reports>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*second.runs.lock(), 1);
}

#[test]
fn test_constructor_cycle_is_reported() {
    let container = Container::new();

    let Err(err) = container.make_type::<Chicken>() else {
        panic!("a constructor cycle must not resolve");
    };

    assert!(matches!(err, FrameworkError::CircularDependency { .. }));
    let cycle = format!("{} -> {} -> {}", key_of::<Chicken>(), key_of::<Egg>(), key_of::<Chicken>());
    assert!(err.to_string().contains(&cycle), "{err}");
}

#[test]
fn test_service_fake_is_restored() {
    let container = Container::new();
    {
        let _guard = <dyn Logger>::fake(&container);
        let logger = container.make_type::<dyn Logger>().unwrap();
        assert_eq!(logger.write("hidden"), "");
    }
    let logger = container.make_type::<dyn Logger>().unwrap();
    assert_eq!(logger.write("shown"), "console: shown");
}

#[injectable]
#[derive(Default)]
pub struct Journal {
    entries: Mutex<Vec<String>>,
}

impl Journal {
    fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

#[injectable(middleware)]
pub struct Stamp {
    #[inject]
    journal: Arc<Journal>,
}

impl Middleware for Stamp {
    fn handle(&self, request: Request, next: Next<'_>) -> Response {
        self.handle_with_params(request, next, &[])
    }

    fn handle_with_params(&self, request: Request, next: Next<'_>, params: &[String]) -> Response {
        self.journal.push(format!("stamp[{}]", params.join(",")));
        next(request)
    }
}

#[injectable(middleware)]
pub struct Gate {
    #[inject]
    journal: Arc<Journal>,
}

impl Middleware for Gate {
    fn handle(&self, request: Request, next: Next<'_>) -> Response {
        if request.header("authorization").is_none() {
            self.journal.push("gate: denied");
            return HttpResponse::text("Unauthorized").status(401).ok();
        }
        self.journal.push("gate: allowed");
        next(request)
    }
}

fn container() -> Arc<Container> {
    let container = Arc::new(Container::new());
    container.singleton(key_of::<Journal>(), Concrete::class_of::<Journal>());
    container
}

#[test]
fn test_injectable_middleware_resolves_by_key() {
    let container = container();
    let registry = MiddlewareRegistry::new(container.clone())
        .global([format!("{}:a,b", key_of::<Stamp>())]);

    let response = registry
        .handle(Request::build("GET", "/").unwrap(), |_| HttpResponse::text("ok").ok())
        .unwrap();

    assert_eq!(response.body(), "ok");
    let journal = container.make_type::<Journal>().unwrap();
    assert_eq!(journal.entries(), vec!["stamp[a,b]"]);
}

#[test]
fn test_registry_end_to_end() {
    let container = container();
    let registry = MiddlewareRegistry::new(container.clone())
        .alias::<Stamp>("stamp")
        .alias::<Gate>("auth")
        .group("web", ["stamp:web"])
        .global(["web"])
        .route("/admin/*", ["auth"])
        .set_priority("auth", 10);
    let journal = container.make_type::<Journal>().unwrap();
    let destination = |request: Request| HttpResponse::text(request.path().to_string()).ok();

    let denied = registry
        .handle(Request::build("GET", "/admin/users").unwrap(), destination)
        .unwrap();
    assert_eq!(denied.status_code(), 401);
    assert_eq!(journal.entries(), vec!["gate: denied"]);

    let mut request = Request::build("GET", "/admin/users").unwrap();
    request.set_header("authorization", "Bearer token").unwrap();
    let allowed = registry.handle(request, destination).unwrap();
    assert_eq!(allowed.body(), "/admin/users");
    assert_eq!(
        journal.entries(),
        vec!["gate: denied", "gate: allowed", "stamp[web]"]
    );
}

#[test]
fn test_unknown_middleware_name_is_a_resolution_error() {
    let registry = MiddlewareRegistry::new(container()).global(["missing"]);

    let err = registry
        .handle(Request::build("GET", "/").unwrap(), |_| HttpResponse::new().ok())
        .unwrap_err();

    assert!(err.is_resolution());
    assert_eq!(err.to_string(), "Target class [missing] does not exist");
}
