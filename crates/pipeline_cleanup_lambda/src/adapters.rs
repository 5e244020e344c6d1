pub mod aws;
pub mod distribution;
pub mod pipeline;
pub mod remote_error;
pub mod storage;
