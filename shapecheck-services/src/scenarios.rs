//! Acceptance scenarios as given/when/then steps over a per-scenario World.
//!
//! Steps return `StepError` rather than panicking. A fresh World is built for every scenario.

use std::fmt;

use serde_json::Value;
use shapecheck_core::shapes::{self, ShapeError};
use shapecheck_core::{Order, User};
use thiserror::Error;

use crate::driver::{ApiResponse, DriverError, OrderServiceClient, UserServiceClient};

#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("no response recorded; run a `when` step first")]
    NoResponse,
    #[error("expected status {expected}, got {actual} (body: {body})")]
    Status {
        expected: u16,
        actual: u16,
        body: Value,
    },
    #[error("response does not match shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("field {field}: expected {expected}, got {actual}")]
    Mismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

fn check_eq<T: PartialEq + fmt::Debug>(field: &str, expected: T, actual: T) -> Result<(), StepError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StepError::Mismatch {
            field: field.to_string(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        })
    }
}

/// Per-scenario state: service clients, the user under test, the last response.
pub struct World {
    users: UserServiceClient,
    orders: OrderServiceClient,
    user_id: i64,
    response: Option<ApiResponse>,
}

impl World {
    pub fn new(users: UserServiceClient, orders: OrderServiceClient) -> Self {
        Self {
            users,
            orders,
            user_id: 0,
            response: None,
        }
    }

    pub fn response(&self) -> Result<&ApiResponse, StepError> {
        self.response.as_ref().ok_or(StepError::NoResponse)
    }

    // given

    pub fn given_user_exists(&mut self, user_id: i64) -> Result<(), StepError> {
        if user_id <= 0 {
            return Err(StepError::Precondition(format!(
                "user id must be positive, got {}",
                user_id
            )));
        }
        self.user_id = user_id;
        Ok(())
    }

    // when

    pub async fn when_client_retrieves_user(&mut self, user_id: i64) -> Result<(), StepError> {
        self.response = Some(self.users.get_user(user_id).await?);
        Ok(())
    }

    pub async fn when_client_retrieves_orders(&mut self, user_id: i64) -> Result<(), StepError> {
        self.response = Some(self.orders.list_orders(user_id).await?);
        Ok(())
    }

    pub async fn when_client_retrieves_orders_with_raw_user_id(
        &mut self,
        raw_user_id: &str,
    ) -> Result<(), StepError> {
        self.response = Some(self.orders.list_orders_raw(raw_user_id).await?);
        Ok(())
    }

    pub async fn when_client_creates_order(
        &mut self,
        user_id: i64,
        amount: f64,
    ) -> Result<(), StepError> {
        self.response = Some(self.orders.create_order(user_id, amount).await?);
        Ok(())
    }

    // then

    pub fn then_status_is(&self, expected: u16) -> Result<(), StepError> {
        let resp = self.response()?;
        if resp.status != expected {
            return Err(StepError::Status {
                expected,
                actual: resp.status,
                body: resp.body.clone(),
            });
        }
        Ok(())
    }

    /// Body is a valid User with the current user id and the given name and email.
    pub fn then_valid_user(&self, name: &str, email: &str) -> Result<User, StepError> {
        let user: User = shapes::decode(&self.response()?.body)?;
        check_eq("id", self.user_id, user.id)?;
        check_eq("name", name, user.name.as_str())?;
        check_eq("email", email, user.email.as_str())?;
        Ok(user)
    }

    /// Body is an array of valid Orders, all belonging to the current user.
    pub fn then_order_list(&self) -> Result<Vec<Order>, StepError> {
        let orders: Vec<Order> = shapes::decode_vec(&self.response()?.body)?;
        for order in &orders {
            check_eq("userId", self.user_id, order.user_id)?;
        }
        Ok(orders)
    }

    /// Body is a valid new Order with a positive id and the given user and amount.
    pub fn then_new_order(&self, user_id: i64, amount: f64) -> Result<Order, StepError> {
        let order: Order = shapes::decode(&self.response()?.body)?;
        if order.order_id <= 0 {
            return Err(StepError::Mismatch {
                field: "orderId".into(),
                expected: "a positive id".into(),
                actual: order.order_id.to_string(),
            });
        }
        check_eq("userId", user_id, order.user_id)?;
        check_eq("amount", amount, order.amount)?;
        Ok(order)
    }

    /// Body is `{"error": <string>}`.
    pub fn then_error_reported(&self) -> Result<String, StepError> {
        let resp = self.response()?;
        resp.error_message()
            .map(str::to_string)
            .ok_or_else(|| StepError::Mismatch {
                field: "error".into(),
                expected: "an error message".into(),
                actual: resp.body.to_string(),
            })
    }
}

/// Result of one named scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: &'static str,
    pub result: Result<(), StepError>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

pub async fn retrieve_user_information(mut w: World) -> Result<(), StepError> {
    w.given_user_exists(1)?;
    w.when_client_retrieves_user(1).await?;
    w.then_status_is(200)?;
    w.then_valid_user("Alice", "alice@example.com")?;
    Ok(())
}

pub async fn retrieve_active_orders(mut w: World) -> Result<(), StepError> {
    w.given_user_exists(1)?;
    w.when_client_retrieves_orders(1).await?;
    w.then_status_is(200)?;
    w.then_order_list()?;
    Ok(())
}

pub async fn create_new_order(mut w: World) -> Result<(), StepError> {
    w.given_user_exists(1)?;
    w.when_client_creates_order(1, 49.99).await?;
    w.then_status_is(200)?;
    let created = w.then_new_order(1, 49.99)?;

    w.when_client_retrieves_orders(1).await?;
    w.then_status_is(200)?;
    let listed = w.then_order_list()?;
    if !listed.iter().any(|o| o.order_id == created.order_id) {
        return Err(StepError::Mismatch {
            field: "orders".into(),
            expected: format!("to include orderId {}", created.order_id),
            actual: format!("{:?}", listed.iter().map(|o| o.order_id).collect::<Vec<_>>()),
        });
    }
    Ok(())
}

pub async fn unknown_user_is_not_found(mut w: World) -> Result<(), StepError> {
    w.when_client_retrieves_user(999).await?;
    w.then_status_is(404)?;
    w.then_error_reported()?;
    Ok(())
}

pub async fn non_numeric_user_id_is_rejected(mut w: World) -> Result<(), StepError> {
    w.when_client_retrieves_orders_with_raw_user_id("abc").await?;
    w.then_status_is(400)?;
    w.then_error_reported()?;
    Ok(())
}

/// Run every scenario in order, each against a fresh World.
pub async fn run_all(
    users: &UserServiceClient,
    orders: &OrderServiceClient,
) -> Vec<ScenarioOutcome> {
    let world = || World::new(users.clone(), orders.clone());
    vec![
        ScenarioOutcome {
            name: "retrieve user information",
            result: retrieve_user_information(world()).await,
        },
        ScenarioOutcome {
            name: "retrieve active orders",
            result: retrieve_active_orders(world()).await,
        },
        ScenarioOutcome {
            name: "create a new order",
            result: create_new_order(world()).await,
        },
        ScenarioOutcome {
            name: "unknown user is not found",
            result: unknown_user_is_not_found(world()).await,
        },
        ScenarioOutcome {
            name: "non-numeric user id is rejected",
            result: non_numeric_user_id_is_rejected(world()).await,
        },
    ]
}
