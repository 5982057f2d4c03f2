//! Persistence layer.

pub mod users;

pub use users::{InMemoryUserStore, PgUserStore, UserStore};
