//! Builder API for machine definitions.
//!
//! This module provides the fluent [`MachineBuilder`], which validates a
//! machine's state and transition tables before any instance can run them,
//! and the macros that declare state and event sets with minimal boilerplate.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
