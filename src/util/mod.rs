//! Utility modules: retry decisions and cancellation.

pub mod cancel;
pub mod retry;
