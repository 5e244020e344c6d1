//! AWS-oriented adapters and handlers for the pipeline cleanup action.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! collaborator traits it drives, and remote error translation) on top of the
//! contract and caller-reference primitives in `pipeline_cleanup_core`.

pub mod adapters;
pub mod handlers;
pub mod telemetry;
