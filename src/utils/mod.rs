//! Utility functions and helpers.

pub mod http;
pub mod oauth;
pub mod retry;

pub use retry::{RetryPolicy, retry};
