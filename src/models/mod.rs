//! Request/response structs and row types, one submodule per domain:
//! - `task`: tasks and their list-filter query parameters
//! - `tag`: user-owned tag labels
//! - `user`: accounts and auth payloads

pub mod tag;
pub mod task;
pub mod user;

pub use tag::*;
pub use task::*;
pub use user::*;
