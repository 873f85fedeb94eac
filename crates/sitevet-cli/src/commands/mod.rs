//! CLI command implementations.

pub mod review;
pub mod status;
