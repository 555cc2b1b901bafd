/*!
 * Monitoring
 * Tracing setup and run metrics
 */

pub mod metrics;
pub mod tracer;

pub use metrics::{Progress, WorkerStats};
pub use tracer::{generate_run_id, init_tracing};
