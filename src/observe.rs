//! Observability boundary
//!
//! Every stage reports decision events as structured `(agent, event_type,
//! data)` triples. Sinks subscribe through the `tracing` infrastructure;
//! the pipeline itself never blocks on emission.

use serde_json::Value;
use tracing::info;

pub const TARGET: &str = "pipeline_events";

/// Emit one structured pipeline event.
pub fn emit(agent: &str, event_type: &str, data: Value) {
    info!(
        target: TARGET,
        agent,
        event_type,
        data = %data,
        "pipeline event"
    );
}
