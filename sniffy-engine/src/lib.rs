//! # sniffy-engine
//!
//! The flow metering loop and its runtime: a blocking capture pipeline, the
//! periodic expiry sweeper and the metrics exporter, sharing one
//! [`FlowContext`].

pub mod context;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod sweeper;

pub use context::FlowContext;
pub use error::EngineError;
pub use pipeline::{Pipeline, PipelineStats, StepOutcome};
pub use runtime::{resolve_local_mac, run_production_mode};
pub use sweeper::Sweeper;
