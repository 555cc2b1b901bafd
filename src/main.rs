/*!
 * Dual-Lock - Main Entry Point
 *
 * Runs both workers for `ITERATIONS` increments each with mirrored lock
 * orders and hold-and-retreat, then prints the elapsed seconds and the final
 * counter to stdout.
 */

use dual_lock::{init_tracing, Coordinator, CoordinatorConfig, ITERATIONS};
use tracing::info;

fn main() -> miette::Result<()> {
    init_tracing();

    info!(iterations = ITERATIONS, "Dual-lock experiment starting...");

    let coordinator = Coordinator::new(CoordinatorConfig::hold_and_retreat(ITERATIONS))?;
    let report = coordinator.run()?;

    if !report.is_consistent() {
        tracing::warn!(
            counter = report.counter,
            expected = report.expected(),
            violations = report.exclusion_violations,
            "Final counter does not match the iteration budget"
        );
    }

    println!("{}", report.elapsed.as_secs_f64());
    println!("{}", report.counter);
    Ok(())
}
