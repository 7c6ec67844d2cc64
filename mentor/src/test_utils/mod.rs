//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//! The mocks are plain in-memory structs configured with `with_*` builders,
//! so tests control exactly what each port returns.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
