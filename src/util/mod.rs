//! Utility functions and helpers
//!
//! ## Modules
//!
//! - [`retry`] - Fixed-interval polling for conditions that settle asynchronously

pub mod retry;
