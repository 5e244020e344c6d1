//! Shared pipeline cleanup domain primitives.
//!
//! This crate owns the CodePipeline job contract, the failure taxonomy and
//! caller-reference generation. It intentionally excludes AWS SDK and Lambda
//! runtime concerns.

pub mod batching;
pub mod caller_reference;
pub mod contract;
