//! Test support: fixtures and in-memory mocks
//!
//! Exported so integration tests in downstream crates can build the same
//! records and fake collaborators as the unit tests here.

pub mod fixtures;
pub mod mocks;
