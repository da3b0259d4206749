//! Tower middleware layers applied by [`server::build_router`](crate::server::build_router).
//!
//! [`correlation`] tags every exchange with an `X-Correlation-Id` and
//! exposes it to cross-origin clients. Failure-to-response conversion
//! (timeouts, panics, body limits) comes from `tower-http` and is wired in
//! the server module.

pub mod correlation;
