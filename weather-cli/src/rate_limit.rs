//! Per-client-IP rate limiting in front of the weather routes.
//!
//! Over-limit requests are rejected immediately; they never reach the lookup.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};

use crate::error::ApiError;

/// Burst of `per_minute` with one slot returned per minute, so no 60 s window
/// ever admits more than `per_minute` requests from one client.
fn quota(per_minute: NonZeroU32) -> Quota {
    Quota::per_minute(NonZeroU32::MIN).allow_burst(per_minute)
}

/// Keyed GCRA limiter over client IPs.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl IpRateLimiter {
    pub fn per_minute(per_minute: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota(per_minute))),
        }
    }

    /// Take one slot for `ip`. Returns false if the caller is over the limit.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Drop state for clients whose buckets are full again.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

pub async fn limit_by_ip(
    State(limiter): State<IpRateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.check(addr.ip()) {
        next.run(request).await
    } else {
        tracing::warn!(client = %addr.ip(), path = %request.uri().path(), "Rate limit exceeded");
        ApiError::RateLimited.into_response()
    }
}
