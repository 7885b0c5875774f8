pub mod database;
pub mod permissions;
pub mod provider;
pub mod session;

pub use database::Database;
pub use permissions::{evaluate_route, has_permission, Permission, RouteDecision};
pub use provider::{AuthProvider, HttpAuthProvider, MockAuthProvider};
pub use session::SessionService;
