//! Helper utilities for integration tests.

pub mod fake_tools;

pub use fake_tools::*;
pub use layout::*;
