//! Order service: `GET /orders?userId=N`, `POST /orders`, `GET /health`.

use std::sync::Arc;

use clap::Parser;
use shapecheck_core::{telemetry, ServerArgs};
use shapecheck_services::orders::{self, OrderStore};

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "In-memory order management service")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init();
    let cli = Cli::parse();
    let (host, port) = cli.server.host_port(orders::DEFAULT_PORT);

    let store = OrderStore::seeded();
    tracing::info!(orders = store.len()?, "order store seeded");
    let app = orders::app(Arc::new(store))?;
    shapecheck_core::http::run(app, &host, port)
}
