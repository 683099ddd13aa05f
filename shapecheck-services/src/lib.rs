//! shapecheck services: in-memory user and order stubs, and the acceptance driver that
//! exercises them over HTTP.

pub mod driver;
pub mod health;
pub mod orders;
pub mod parse;
pub mod scenarios;
pub mod users;

pub use driver::{
    ApiResponse, DriverError, HttpTransport, InProcessTransport, OrderServiceClient, Transport,
    UserServiceClient,
};
pub use orders::OrderStore;
pub use scenarios::{ScenarioOutcome, StepError, World};
pub use shapecheck_core::CoreError;
pub use users::UserStore;
