//! Order service: list orders by user, create orders. Order ids are assigned in increasing
//! order and never reused.

use std::sync::{Arc, Mutex, MutexGuard};

use shapecheck_core::{App, CoreError, HttpModule, Order, RequestContext, Response};

use crate::health;
use crate::parse::{int_from_value, is_set, number_from_value, parse_int_prefix};

pub const DEFAULT_PORT: u16 = 3002;

#[derive(Debug)]
struct OrderTable {
    orders: Vec<Order>,
    /// `None` once the id space is used up.
    next_order_id: Option<i64>,
}

/// In-memory order table. Shared between connections behind a mutex.
#[derive(Debug)]
pub struct OrderStore {
    table: Mutex<OrderTable>,
}

impl OrderStore {
    /// Store holding `orders`; new ids start after the largest existing one.
    pub fn new(orders: Vec<Order>) -> Self {
        let next_order_id = orders
            .iter()
            .map(|o| o.order_id)
            .max()
            .unwrap_or(0)
            .checked_add(1);
        Self {
            table: Mutex::new(OrderTable {
                orders,
                next_order_id,
            }),
        }
    }

    /// One seeded order for user 1; the next id is 2.
    pub fn seeded() -> Self {
        Self::new(vec![Order {
            order_id: 1,
            user_id: 1,
            amount: 49.99,
        }])
    }

    fn lock(&self) -> Result<MutexGuard<'_, OrderTable>, CoreError> {
        self.table
            .lock()
            .map_err(|e| CoreError::Internal(format!("order store poisoned: {}", e)))
    }

    /// Orders of `user_id` in creation order.
    pub fn for_user(&self, user_id: i64) -> Result<Vec<Order>, CoreError> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    pub fn create(&self, user_id: i64, amount: f64) -> Result<Order, CoreError> {
        let mut table = self.lock()?;
        let order_id = table
            .next_order_id
            .ok_or_else(|| CoreError::Internal("order ids exhausted".into()))?;
        let order = Order {
            order_id,
            user_id,
            amount,
        };
        table.next_order_id = order_id.checked_add(1);
        table.orders.push(order.clone());
        Ok(order)
    }

    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.lock()?.orders.len())
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn list_orders(store: &OrderStore, req: &RequestContext) -> Result<Response, CoreError> {
    let user_id = req
        .query_param("userId")
        .and_then(parse_int_prefix)
        .ok_or_else(|| CoreError::BadRequest("userId query parameter is required".into()))?;
    Response::ok(&store.for_user(user_id)?)
}

fn create_order(store: &OrderStore, req: &RequestContext) -> Result<Response, CoreError> {
    let body = req.json_body()?;
    let user_id = body.get("userId").filter(|v| is_set(v));
    let amount = body.get("amount").filter(|v| !v.is_null());
    let (Some(user_id), Some(amount)) = (user_id, amount) else {
        return Err(CoreError::BadRequest("userId and amount are required".into()));
    };
    let user_id = int_from_value(user_id)
        .ok_or_else(|| CoreError::BadRequest("userId must be an integer".into()))?;
    let amount = number_from_value(amount)
        .ok_or_else(|| CoreError::BadRequest("amount must be a number".into()))?;

    let order = store.create(user_id, amount)?;
    tracing::info!(order_id = order.order_id, user_id, amount, "order created");
    Response::ok(&order)
}

/// `GET /orders?userId=N` and `POST /orders`.
pub fn module(store: Arc<OrderStore>) -> HttpModule {
    let list_store = Arc::clone(&store);
    HttpModule::new("orders", None)
        .route(
            "",
            move |req: &RequestContext| list_orders(&list_store, req),
            &["GET"],
        )
        .route(
            "",
            move |req: &RequestContext| create_order(&store, req),
            &["POST"],
        )
}

/// Order service app: orders routes plus health.
pub fn app(store: Arc<OrderStore>) -> Result<App, CoreError> {
    let mut app = App::new();
    app.register(&mut module(store))?;
    app.register(&mut health::module())?;
    Ok(app)
}
