//! Acceptance driver end to end: both services on ephemeral ports, driven over HTTP.
//! The individual scenarios run from `tests/features/user_orders.feature`.

use std::sync::Arc;

use shapecheck_core::http::{spawn, ServerHandle};
use shapecheck_services::scenarios::{self, World};
use shapecheck_services::{
    orders, users, InProcessTransport, OrderServiceClient, OrderStore, StepError,
    UserServiceClient, UserStore,
};

struct Services {
    user_server: ServerHandle,
    order_server: ServerHandle,
}

impl Services {
    async fn start() -> Self {
        let user_app = users::app(Arc::new(UserStore::seeded())).unwrap();
        let order_app = orders::app(Arc::new(OrderStore::seeded())).unwrap();
        Self {
            user_server: spawn(user_app, "127.0.0.1:0").await.unwrap(),
            order_server: spawn(order_app, "127.0.0.1:0").await.unwrap(),
        }
    }

    fn users(&self) -> UserServiceClient {
        UserServiceClient::http(&self.user_server.base_url()).unwrap()
    }

    fn orders(&self) -> OrderServiceClient {
        OrderServiceClient::http(&self.order_server.base_url()).unwrap()
    }

    fn world(&self) -> World {
        World::new(self.users(), self.orders())
    }

    async fn stop(self) {
        self.user_server.shutdown().await.unwrap();
        self.order_server.shutdown().await.unwrap();
    }
}

#[tokio::test]
async fn health_endpoints() {
    let services = Services::start().await;
    for resp in [
        services.users().health().await.unwrap(),
        services.orders().health().await.unwrap(),
    ] {
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["status"], "healthy");
    }
    services.stop().await;
}

#[tokio::test]
async fn every_scenario_passes_over_http() {
    let services = Services::start().await;
    let outcomes = scenarios::run_all(&services.users(), &services.orders()).await;
    assert_eq!(outcomes.len(), 5);
    for outcome in &outcomes {
        assert!(outcome.passed(), "{}: {:?}", outcome.name, outcome.result);
    }
    services.stop().await;
}

#[tokio::test]
async fn every_scenario_passes_in_process() {
    let users = UserServiceClient::new(InProcessTransport::new(
        users::app(Arc::new(UserStore::seeded())).unwrap(),
    ));
    let orders = OrderServiceClient::new(InProcessTransport::new(
        orders::app(Arc::new(OrderStore::seeded())).unwrap(),
    ));
    let outcomes = scenarios::run_all(&users, &orders).await;
    assert!(outcomes.iter().all(|o| o.passed()), "{:?}", outcomes);
}

#[tokio::test]
async fn failed_steps_are_reported_not_panicked() {
    let services = Services::start().await;
    let mut world = services.world();

    assert!(matches!(world.then_status_is(200), Err(StepError::NoResponse)));
    assert!(matches!(world.given_user_exists(0), Err(StepError::Precondition(_))));

    world.given_user_exists(1).unwrap();
    world.when_client_retrieves_user(999).await.unwrap();
    match world.then_status_is(200) {
        Err(StepError::Status { expected, actual, .. }) => assert_eq!((expected, actual), (200, 404)),
        other => panic!("expected status mismatch, got {:?}", other),
    }
    assert!(matches!(
        world.then_valid_user("Alice", "alice@example.com"),
        Err(StepError::Shape(_))
    ));

    world.when_client_retrieves_user(1).await.unwrap();
    assert!(matches!(
        world.then_valid_user("Bob", "alice@example.com"),
        Err(StepError::Mismatch { .. })
    ));

    services.stop().await;
}

#[tokio::test]
async fn unreachable_service_is_a_driver_error() {
    let services = Services::start().await;
    let url = services.user_server.base_url();
    services.stop().await;

    let mut world = World::new(
        UserServiceClient::http(&url).unwrap(),
        OrderServiceClient::http(&url).unwrap(),
    );
    assert!(matches!(
        world.when_client_retrieves_user(1).await,
        Err(StepError::Driver(_))
    ));
}

#[tokio::test]
async fn raw_user_id_is_sent_percent_encoded() {
    let orders = OrderServiceClient::new(InProcessTransport::new(
        orders::app(Arc::new(OrderStore::seeded())).unwrap(),
    ));
    // Sent verbatim, "%31" would decode to "1" on the server.
    let resp = orders.list_orders_raw("%31").await.unwrap();
    assert_eq!(resp.status, 400);

    let resp = orders.list_orders_raw("1 ").await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body.as_array().map(Vec::len), Some(1));
}

#[test]
fn only_http_urls_are_accepted() {
    assert!(UserServiceClient::http("https://localhost:3001").is_err());
    assert!(UserServiceClient::http("/no-host").is_err());
    assert!(OrderServiceClient::http("http://localhost:3002").is_ok());
}
