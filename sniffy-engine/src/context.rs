//! Components shared by the pipeline and the sweeper.

use std::sync::Arc;

use prometheus::Registry;
use sniffy_core::prelude::{Clock, FieldSelector, SystemClock, TtlStore};
use sniffy_telemetry::{FlowMetrics, MetricsRecorder};

use crate::error::EngineError;

pub struct FlowContext<C: Clock = SystemClock> {
    pub selector: Arc<FieldSelector>,
    pub flows: Arc<FlowMetrics>,
    pub store: Arc<TtlStore<C>>,
    pub recorder: MetricsRecorder,
}

impl FlowContext<SystemClock> {
    pub fn new(registry: &Registry, selector: Arc<FieldSelector>) -> Result<Self, EngineError> {
        Self::with_clock(registry, selector, SystemClock)
    }
}

impl<C: Clock> FlowContext<C> {
    /// Registers the flow families and self-metrics in `registry`.
    pub fn with_clock(
        registry: &Registry,
        selector: Arc<FieldSelector>,
        clock: C,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            flows: Arc::new(FlowMetrics::new(registry, Arc::clone(&selector))?),
            recorder: MetricsRecorder::new(registry)?,
            store: Arc::new(TtlStore::with_clock(clock)),
            selector,
        })
    }
}

impl<C: Clock> Clone for FlowContext<C> {
    fn clone(&self) -> Self {
        Self {
            selector: Arc::clone(&self.selector),
            flows: Arc::clone(&self.flows),
            store: Arc::clone(&self.store),
            recorder: self.recorder.clone(),
        }
    }
}
