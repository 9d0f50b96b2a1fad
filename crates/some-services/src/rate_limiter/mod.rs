pub mod admission;
pub mod token_bucket;

pub use admission::TokenBucket;
pub use token_bucket::{rate_limit_middleware, RateLimitError, TokenBucketRateLimiter};
