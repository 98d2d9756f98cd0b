//! Data access layer. Route handlers call into these modules; nothing here
//! knows about HTTP.
//!
//! - `tasks`: task CRUD, toggle, and the filtered list query
//! - `tags`: tag CRUD and get-or-create resolution
//! - `users`: accounts and refresh tokens

pub mod tags;
pub mod tasks;
pub mod users;

pub use tags::*;
pub use tasks::*;
