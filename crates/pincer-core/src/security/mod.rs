//! Security gate: allowlist plus per-user sliding-window rate limiting
//!
//! Every message passes [`SecurityGate::authorize`] before any tool or the
//! inference backend is touched.

mod allowlist;
mod gate;
mod rate_limiter;


pub use allowlist::AllowList;
pub use gate::{Decision, SecurityGate};
pub use rate_limiter::{RateLimitConfig, RateLimitResult, RateLimiter};
