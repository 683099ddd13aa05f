//! Run the acceptance scenarios against live user and order services.
//! Exits with an error when any scenario fails.

use clap::Parser;
use shapecheck_core::telemetry;
use shapecheck_services::driver::{DEFAULT_ORDER_SERVICE_URL, DEFAULT_USER_SERVICE_URL};
use shapecheck_services::{scenarios, OrderServiceClient, UserServiceClient};

#[derive(Parser)]
#[command(name = "acceptance")]
#[command(about = "Acceptance scenarios for the user and order services")]
struct Cli {
    /// Base URL of the user service.
    #[arg(long, env = "USER_SERVICE_URL", default_value = DEFAULT_USER_SERVICE_URL)]
    user_service_url: String,
    /// Base URL of the order service.
    #[arg(long, env = "ORDER_SERVICE_URL", default_value = DEFAULT_ORDER_SERVICE_URL)]
    order_service_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    telemetry::init();
    let cli = Cli::parse();
    let users = UserServiceClient::http(&cli.user_service_url)?;
    let orders = OrderServiceClient::http(&cli.order_service_url)?;

    let outcomes = scenarios::run_all(&users, &orders).await;
    let failed = outcomes.iter().filter(|o| !o.passed()).count();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => tracing::info!(scenario = outcome.name, "passed"),
            Err(e) => tracing::error!(scenario = outcome.name, error = %e, "failed"),
        }
    }
    tracing::info!(total = outcomes.len(), failed, "acceptance run finished");

    if failed > 0 {
        return Err(format!("{} of {} scenarios failed", failed, outcomes.len()).into());
    }
    Ok(())
}
