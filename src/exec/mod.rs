// src/exec/mod.rs

//! Job execution layer.
//!
//! - [`job_runner`] runs a single build or push (with retries) against a
//!   container engine.
//! - [`backend`] provides the `JobBackend` trait and the Tokio-task based
//!   `RealJobBackend`; tests replace it with a fake.

pub mod backend;
pub mod job_runner;

pub use backend::{JobBackend, RealJobBackend};
pub use job_runner::{PushRetry, run_build, run_push};
