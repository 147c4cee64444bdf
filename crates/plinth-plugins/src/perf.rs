//! Timing for pipeline sections.

use std::future::Future;
use std::time::Instant;

use tracing::{Instrument, debug, info_span};

/// Run `fut` inside a `plinth.perf` span named `label`, logging how long it
/// took once it completes.
pub(crate) async fn timed<F: Future>(label: &str, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut
        .instrument(info_span!("plinth.perf", section = label))
        .await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    debug!(section = label, duration_ms, "Section completed");
    output
}
