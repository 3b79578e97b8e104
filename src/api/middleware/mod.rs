//! API middleware components

pub mod caller;
pub mod logging;
pub mod metrics;

pub use caller::{Caller, AUTH_EMAIL_HEADER};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
