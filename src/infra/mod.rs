//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod replay;
pub mod telemetry;
