pub mod auth;
pub mod guard;
pub mod rate_limit;

pub use auth::{auth_middleware, require_admin_middleware, CurrentUser};
pub use guard::route_guard_middleware;
pub use rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter};
