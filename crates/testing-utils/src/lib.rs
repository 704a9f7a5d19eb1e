//! # Fleet Testing Utils
//!
//! Shared test support for the fleet workspace.
//!
//! - **Builders**: addresses, clients, drivers and services with sensible defaults
//! - **Fixtures**: a Bogotá pickup with drivers placed at known distances
//! - **Mocks**: port doubles that lose claim races, fail writes, or interleave
//!   a rival operation between a read and a write
//!
//! ```toml
//! [dev-dependencies]
//! fleet-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
