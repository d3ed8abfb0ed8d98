//! Common types, protocol definitions, and errors shared across the record-store telemetry crates.

pub mod error;
pub mod labels;
pub mod protocol;

pub use error::TelemetryError;
