//! Runtime module
//!
//! Channel-backed task and stream handles shared by the provider adapter,
//! the quality scorer and the pipeline.

pub mod async_task;

pub use async_task::{AsyncStream, AsyncTask, StreamSender, TaskAborted};
