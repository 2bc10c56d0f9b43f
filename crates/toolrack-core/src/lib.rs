//! Tool handler contract, registration table and dispatch core.
//!
//! Handlers are registered explicitly at startup through
//! [`ToolRegistryBuilder`]; the [`Dispatcher`] resolves symbolic names,
//! invokes handlers, normalises their output and wraps every call with
//! optional metrics/trace recording.

pub mod dispatch;
pub mod handler;
pub mod observe;
pub mod registry;

pub use dispatch::{DispatchError, Dispatcher};
pub use handler::{parse_args, ToolError, ToolHandler};
pub use observe::{
    CallStatus, MetricsSink, Observability, RecordingMetrics, RecordingTrace, SpanStatus,
    TraceSink, TracingSink,
};
pub use registry::{RegistryError, ToolRegistry, ToolRegistryBuilder};
