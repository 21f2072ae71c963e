//! Authentication core: password hashing, input rules, session tokens,
//! the request gate and the account handlers built on them.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;
pub mod validation;

pub use middleware::{AuthGate, AuthenticatedUser};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{Claims, TokenService};
