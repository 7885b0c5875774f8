//! IP-keyed rate limiting for auth endpoints.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::error::AppError;

/// Rate limiter keyed by IP address.
pub type IpRateLimiter =
    Arc<RateLimiter<SocketAddr, DashMapStateStore<SocketAddr>, DefaultClock>>;

/// Create a keyed rate limiter (by IP) allowing `attempts` per window.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = attempts.max(1);
    let period = Duration::from_millis((window_seconds * 1000) / attempts as u64);
    let quota = Quota::with_period(period)
        .expect("Failed to create quota with valid period")
        .allow_burst(NonZeroU32::new(attempts).expect("attempts is guaranteed to be non-zero"));

    Arc::new(RateLimiter::dashmap(quota))
}

/// Middleware for IP-based rate limiting. Honors x-forwarded-for when a
/// proxy is in front.
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<std::net::IpAddr>().ok());

    let addr = if let Some(ip) = forwarded_ip {
        Some(SocketAddr::new(ip, 0))
    } else {
        request
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|axum::extract::ConnectInfo(addr)| *addr)
    };

    match addr {
        Some(addr) => match limiter.check_key(&addr) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                Err(AppError::TooManyRequests(
                    "Too many requests from this IP. Please try again later.".to_string(),
                    Some(wait_time.as_secs()),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
