//! Per-client admission control for the API.

mod token_bucket;

pub use token_bucket::{RateLimitConfig, TokenBucketLimiter, DEFAULT_CLEANUP_INTERVAL};
