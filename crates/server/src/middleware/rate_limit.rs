//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two limiters, both keyed by client IP (see [`ClientIpKeyExtractor`]):
//! - `api_rate_limiter`: every `/api` route, ~100 requests per 15 minutes
//! - `auth_rate_limiter`: the login route, 5 requests per 15 minutes

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Single-value headers set by the fronting proxy, checked in order.
const PROXY_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "fly-client-ip", "x-real-ip"];

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor for the per-client limiters.
///
/// Without a trusted proxy the key is the TCP peer address, so clients cannot
/// pick their own bucket through headers. Behind a proxy
/// (`TRUST_PROXY_HEADERS=true`) the proxy's headers are read first, then the
/// rightmost `X-Forwarded-For` entry, which is the one the proxy appended.
///
/// The peer fallback needs the router served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy: bool) -> Self {
        Self { trust_proxy }
    }

    fn from_proxy_headers<T>(req: &Request<T>) -> Option<IpAddr> {
        let headers = req.headers();
        let parse = |s: &str| s.trim().parse::<IpAddr>().ok();

        PROXY_IP_HEADERS
            .iter()
            .find_map(|name| headers.get(*name)?.to_str().ok().and_then(parse))
            .or_else(|| {
                headers
                    .get("x-forwarded-for")?
                    .to_str()
                    .ok()?
                    .rsplit(',')
                    .next()
                    .and_then(parse)
            })
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = self.trust_proxy.then(|| Self::from_proxy_headers(req)).flatten() {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for the login endpoint: 5 requests per 15 minutes per IP.
///
/// Configuration: 1 request every 180 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(trust_proxy: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy))
        .per_second(180)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(180) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for the API: ~100 requests per 15 minutes per IP.
///
/// Configuration: 1 request every 9 seconds (replenish), burst of 100.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter(trust_proxy: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy))
        .per_second(9)
        .burst_size(100)
        .finish()
        .expect("rate limiter config with per_second(9) and burst_size(100) is valid");
    GovernorLayer::new(Arc::new(config))
}
