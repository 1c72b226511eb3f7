//! vanguard-kiosk — Visitor-enrollment kiosk.
//!
//! The enrollment scanner phase machine, the outer session flow, the
//! campus assistant fallback, and env-based configuration.

pub mod assistant;
pub mod config;
pub mod scanner;
pub mod session;
