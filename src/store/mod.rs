//! SQLite persistence, independent of the market data pipeline.

pub mod users;

pub use users::{User, UserStore};
