//! shapecheck core: shape validation, routing, request handling, HTTP server.

pub mod config;
pub mod http;
pub mod module;
pub mod router;
pub mod routing;
pub mod schema;
pub mod shapes;
pub mod telemetry;

pub use config::ServerArgs;
pub use module::Module;
pub use router::{Params, RouteId, Router};
pub use routing::HttpModule;
pub use schema::{validate, validate_array, FieldType, Shape, ValidationResult};
pub use shapes::{Order, Shaped, User};

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound(_) => 404,
            CoreError::BadRequest(_) | CoreError::Json(_) => 400,
            CoreError::PayloadTooLarge(_) => 413,
            CoreError::Internal(_) => 500,
        }
    }
}

/// One incoming request as seen by handlers. `params` is filled in by the router.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub params: Params,
    pub body: Vec<u8>,
}

impl RequestContext {
    /// `target` is a path with an optional query string, e.g. `/orders?userId=1`.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, qs)) => (path, parse_query(qs)),
            None => (target, HashMap::new()),
        };
        Self {
            method: method.to_uppercase(),
            path: path.to_owned(),
            query,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Body parsed as JSON. An empty body reads as an empty object.
    pub fn json_body(&self) -> Result<Value, CoreError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Parse `a=1&b=2`. The first occurrence of a key wins; `+` and `%XX` are decoded.
pub fn parse_query(qs: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in form_urlencoded::parse(qs.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Handler output: status, body bytes, content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Response {
    pub fn json<T: Serialize + ?Sized>(status_code: u16, value: &T) -> Result<Self, CoreError> {
        Ok(Self {
            status_code,
            body: serde_json::to_vec(value)?,
            content_type: Some("application/json".into()),
        })
    }

    pub fn ok<T: Serialize + ?Sized>(value: &T) -> Result<Self, CoreError> {
        Self::json(200, value)
    }

    /// `{"error": message}` with the status the error maps to.
    pub fn from_error(err: &CoreError) -> Self {
        let body = serde_json::json!({ "error": err.to_string() });
        Self {
            status_code: err.status_code(),
            body: body.to_string().into_bytes(),
            content_type: Some("application/json".into()),
        }
    }

    pub fn json_value(&self) -> Result<Value, CoreError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Route handler: request in, response or error out. Errors become `{"error": ..}` bodies.
pub type Handler = Arc<dyn Fn(&RequestContext) -> Result<Response, CoreError> + Send + Sync>;

/// Registered route: method and path pattern.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteId,
    pub method: String,
    pub path: String,
}

/// Core app: routes and their handlers.
pub struct App {
    router: Router,
    routes: HashMap<RouteId, Route>,
    handlers: HashMap<RouteId, Handler>,
    next_route_id: u32,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: HashMap::new(),
            handlers: HashMap::new(),
            next_route_id: 0,
        }
    }

    /// Register a route. Path may contain `:name` segments. Registering the same
    /// method and pattern twice is an error.
    pub fn register_route(
        &mut self,
        method: &str,
        path: &str,
        handler: Handler,
    ) -> Result<RouteId, CoreError> {
        let method = method.to_uppercase();
        let path = path.trim_matches('/');
        if self
            .routes
            .values()
            .any(|r| r.method == method && r.path == path)
        {
            return Err(CoreError::Internal(format!(
                "duplicate route {} /{}",
                method, path
            )));
        }
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        self.router.add(&method, path, id);
        self.routes.insert(
            id,
            Route {
                id,
                method,
                path: path.to_owned(),
            },
        );
        self.handlers.insert(id, handler);
        Ok(id)
    }

    pub fn register(&mut self, module: &mut dyn Module) -> Result<(), CoreError> {
        module.register_into(self)
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self.routes.values().collect();
        routes.sort_by_key(|r| r.id.0);
        routes
    }

    /// Match the route, fill in path params and call the handler.
    pub fn try_handle(&self, mut req: RequestContext) -> Result<Response, CoreError> {
        let (route_id, params) = self
            .router
            .match_route(&req.method, &req.path)
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Cannot {} /{}",
                    req.method,
                    req.path.trim_start_matches('/')
                ))
            })?;
        let handler = self
            .handlers
            .get(&route_id)
            .ok_or_else(|| CoreError::Internal(format!("no handler for {:?}", route_id)))?;
        req.params = params;
        handler(&req)
    }

    /// Like `try_handle`, but errors are rendered as JSON error responses.
    pub fn handle(&self, req: RequestContext) -> Response {
        let method = req.method.clone();
        let path = req.path.clone();
        match self.try_handle(req) {
            Ok(resp) => resp,
            Err(err) => {
                if err.status_code() >= 500 {
                    tracing::warn!(%method, %path, error = %err, "handler failed");
                } else {
                    tracing::debug!(%method, %path, error = %err, "request rejected");
                }
                Response::from_error(&err)
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
