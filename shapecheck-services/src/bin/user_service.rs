//! User service: `GET /users/:id`, `GET /health`.

use std::sync::Arc;

use clap::Parser;
use shapecheck_core::{telemetry, ServerArgs};
use shapecheck_services::users::{self, UserStore};

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "In-memory user lookup service")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init();
    let cli = Cli::parse();
    let (host, port) = cli.server.host_port(users::DEFAULT_PORT);

    let store = UserStore::seeded();
    tracing::info!(users = store.len(), "user store seeded");
    let app = users::app(Arc::new(store))?;
    shapecheck_core::http::run(app, &host, port)
}
