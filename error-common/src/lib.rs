//! Common error handling for MediBook binaries
//!
//! Library crates carry their own `thiserror` enums (`DatabaseError`,
//! `WorkflowError`, the server's `ApiError`). This crate holds the error a
//! process returns from `main`: configuration, startup, bind and serve
//! failures, with `anyhow` as the catch-all for plumbing code.

pub mod types;

pub use types::*;
