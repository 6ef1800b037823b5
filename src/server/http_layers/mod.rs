mod rate_limit;
mod requests_logging;

pub use rate_limit::{rate_limit, RATE_LIMIT_EXEMPT_PATHS};
pub use requests_logging::{log_requests, RequestsLoggingLevel};
