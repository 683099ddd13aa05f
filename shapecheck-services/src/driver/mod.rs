//! Acceptance driver: typed clients for the user and order services over a Transport.

mod protocol;
mod transport;

pub use protocol::{ApiResponse, DriverError, Transport};
pub use transport::{HttpTransport, InProcessTransport};

use std::sync::Arc;

use serde_json::json;
use url::form_urlencoded;

pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:3001";
pub const DEFAULT_ORDER_SERVICE_URL: &str = "http://localhost:3002";

/// Client for the user service.
#[derive(Clone)]
pub struct UserServiceClient {
    transport: Arc<dyn Transport>,
}

impl UserServiceClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn http(base_url: &str) -> Result<Self, DriverError> {
        Ok(Self::new(HttpTransport::new(base_url)?))
    }

    /// `GET /users/{id}`.
    pub async fn get_user(&self, id: i64) -> Result<ApiResponse, DriverError> {
        self.transport
            .send("GET", &format!("/users/{}", id), None)
            .await
    }

    pub async fn health(&self) -> Result<ApiResponse, DriverError> {
        self.transport.send("GET", "/health", None).await
    }
}

/// Client for the order service.
#[derive(Clone)]
pub struct OrderServiceClient {
    transport: Arc<dyn Transport>,
}

impl OrderServiceClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn http(base_url: &str) -> Result<Self, DriverError> {
        Ok(Self::new(HttpTransport::new(base_url)?))
    }

    /// `GET /orders?userId={user_id}`.
    pub async fn list_orders(&self, user_id: i64) -> Result<ApiResponse, DriverError> {
        self.list_orders_raw(&user_id.to_string()).await
    }

    /// `GET /orders?userId={raw}` with an arbitrary, possibly non-numeric, value.
    pub async fn list_orders_raw(&self, raw_user_id: &str) -> Result<ApiResponse, DriverError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("userId", raw_user_id)
            .finish();
        let target = format!("/orders?{}", query);
        self.transport.send("GET", &target, None).await
    }

    /// `POST /orders` with `{userId, amount}`.
    pub async fn create_order(&self, user_id: i64, amount: f64) -> Result<ApiResponse, DriverError> {
        let body = json!({ "userId": user_id, "amount": amount });
        self.transport.send("POST", "/orders", Some(&body)).await
    }

    pub async fn health(&self) -> Result<ApiResponse, DriverError> {
        self.transport.send("GET", "/health", None).await
    }
}
