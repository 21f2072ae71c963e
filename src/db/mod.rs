//! User persistence.
//!
//! The auth core only talks to [`UserDirectory`]; Postgres backs it in
//! production and [`MemoryUserDirectory`] in tests and database-less runs.

pub mod memory;
pub mod models;
pub mod operations;

pub use memory::MemoryUserDirectory;
pub use models::User;
pub use operations::{PgUserDirectory, UserDirectory};
