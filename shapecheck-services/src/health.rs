//! `GET /health`, mounted by both services.

use serde_json::json;
use shapecheck_core::{HttpModule, Response};

pub fn module() -> HttpModule {
    HttpModule::new("health", Some("/")).route(
        "health",
        |_req| Response::ok(&json!({ "status": "healthy" })),
        &["GET"],
    )
}
