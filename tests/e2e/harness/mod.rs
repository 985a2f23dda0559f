//! E2E test harness for the smoke and load runs.
//!
//! This module contains test infrastructure with builders, variants, and
//! methods that not every scenario uses.

#![allow(dead_code)]

pub mod runner;
pub mod steps;

// Re-export commonly used types
pub use assertions::Assertion;
pub use scenario::Scenario;
pub use steps::{LoadArgs, SmokeArgs};
