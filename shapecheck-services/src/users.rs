//! User service: read-only lookup over a seeded in-memory table.

use std::collections::BTreeMap;
use std::sync::Arc;

use shapecheck_core::{App, CoreError, HttpModule, RequestContext, Response, User};

use crate::health;
use crate::parse::parse_int_prefix;

pub const DEFAULT_PORT: u16 = 3001;

/// Users by id. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct UserStore {
    users: BTreeMap<i64, User>,
}

impl UserStore {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    /// The single seeded user, Alice.
    pub fn seeded() -> Self {
        Self::new([User {
            id: 1,
            name: "Alice".into(),
            email: "alice@example.com".into(),
        }])
    }

    pub fn get(&self, id: i64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn get_user(store: &UserStore, req: &RequestContext) -> Result<Response, CoreError> {
    let user = req
        .param("id")
        .and_then(parse_int_prefix)
        .and_then(|id| store.get(id))
        .ok_or_else(|| CoreError::NotFound("User not found".into()))?;
    Response::ok(user)
}

/// `GET /users/:id`.
pub fn module(store: Arc<UserStore>) -> HttpModule {
    HttpModule::new("users", None).route(
        ":id",
        move |req: &RequestContext| get_user(&store, req),
        &["GET"],
    )
}

/// User service app: users routes plus health.
pub fn app(store: Arc<UserStore>) -> Result<App, CoreError> {
    let mut app = App::new();
    app.register(&mut module(store))?;
    app.register(&mut health::module())?;
    Ok(app)
}
