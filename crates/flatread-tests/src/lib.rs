//! Shared harness for the flatread integration tests and benchmarks.

pub mod builder;
pub mod fixtures;
pub mod schema;
