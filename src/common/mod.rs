//! Utilities shared by upstream clients

pub mod rate_limiter;

pub use rate_limiter::{RateLimiter, RateLimiterConfig};
