use kit::{AppConfig, Config, Request};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod middleware;
mod routes;
mod services;

fn init_tracing(default_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let container = bootstrap::container()?;
    let log_level = Config::get::<AppConfig>(&container)
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&log_level)?;

    let pipeline = bootstrap::middleware(container.clone())?.pipeline()?;

    let mut signed_in = Request::build("GET", "/admin/reports")?;
    signed_in.set_header("authorization", "Bearer demo")?;

    let requests = vec![
        Request::build("GET", "/")?,
        Request::build("GET", "/admin/reports")?,
        signed_in,
        Request::build("GET", "/missing")?,
    ];

    for request in requests {
        let (method, path) = (request.method().clone(), request.path().to_string());
        match pipeline.execute(request, |request| routes::dispatch(&container, request)) {
            Ok(response) => println!("{} {} -> {} {}", method, path, response.status_code(), response.body()),
            Err(err) => {
                let response = kit::HttpResponse::from(&err);
                println!("{} {} -> {} {}", method, path, response.status_code(), response.body());
            }
        }
    }

    Ok(())
}
