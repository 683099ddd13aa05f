//! Module trait: a group of routes registered into an App.

use crate::{App, CoreError};

/// Module: register routes into the app.
pub trait Module {
    fn register_into(&mut self, app: &mut App) -> Result<(), CoreError>;
}
