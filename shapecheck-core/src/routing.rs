//! HttpModule: routes grouped under a path prefix.

use std::sync::Arc;

use crate::module::Module;
use crate::{App, CoreError, Handler, RequestContext, Response};

/// HTTP module: name, prefix and routes. Attach via `app.register(&mut module)`.
pub struct HttpModule {
    pub name: String,
    pub prefix: String,
    routes: Vec<(String, Handler, String)>,
}

impl HttpModule {
    /// `prefix` defaults to `/{name}`.
    pub fn new(name: &str, prefix: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix
                .map(str::to_string)
                .unwrap_or_else(|| format!("/{}", name)),
            routes: Vec::new(),
        }
    }

    /// Add a route under the module prefix. `path` may be empty and may contain
    /// `:name` segments; methods e.g. `["GET"]`, `["GET", "POST"]`.
    pub fn route(
        mut self,
        path: &str,
        handler: impl Fn(&RequestContext) -> Result<Response, CoreError> + Send + Sync + 'static,
        methods: &[&str],
    ) -> Self {
        let full_path = format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let handler: Handler = Arc::new(handler);
        for method in methods {
            self.routes
                .push((full_path.clone(), Arc::clone(&handler), method.to_string()));
        }
        self
    }
}

impl Module for HttpModule {
    fn register_into(&mut self, app: &mut App) -> Result<(), CoreError> {
        for (path, handler, method) in self.routes.drain(..) {
            app.register_route(&method, &path, handler)?;
            tracing::debug!(module = %self.name, %method, %path, "route registered");
        }
        Ok(())
    }
}
