//! HTTP handlers, one submodule per resource:
//! - `auth`: register, login, refresh, logout, me
//! - `tasks`: task CRUD, filtering, toggle (also holds `AppState`)
//! - `tags`: tag CRUD
//! - `health`: liveness probe

pub mod auth;
pub mod health;
pub mod tags;
pub mod tasks;

pub use health::*;
pub use tags::*;
pub use tasks::*;
