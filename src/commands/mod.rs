//! CLI command implementations for refmap.
//!
//! - [`map`] - Map a batch of samples against a reference
//! - [`index`] - Build the reference index only

pub mod command;
pub mod common;
pub mod index;
pub mod map;
