//! Live session domain.
//!
//! - [`entities::SessionConfig`]: what the client negotiates on connect
//! - [`entities::SessionState`]: lifecycle of the single session per connection
//! - [`turn::Turn`]: one user-to-model exchange and its [`turn::Part`]s

pub mod entities;
pub mod turn;
