//! The eviction sweep.

use mela_core::Rng;
use mela_core::duration::as_millis_i64;
use tracing::trace;

use crate::config::MarkovConfig;
use crate::graph::Graph;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Sweep {
    pub(crate) aged: usize,
    pub(crate) dropped: usize,
}

/// Age pass when the previous one is older than `max_age`, then uniform
/// random removal down to `max_size`. `last_cleanup` tracks age passes.
pub(crate) fn sweep(
    graph: &mut Graph,
    config: &MarkovConfig,
    now: i64,
    last_cleanup: &mut i64,
    rng: &mut Rng<'_>,
) -> Sweep {
    let cutoff = now.saturating_sub(as_millis_i64(config.max_age));
    let mut report = Sweep::default();
    if *last_cleanup < cutoff {
        report.aged = graph.retain_younger(cutoff);
        *last_cleanup = now;
    }
    while graph.len() > config.max_size {
        let k = rng.below(graph.len());
        if graph.remove_nth(k).is_none() {
            break;
        }
        report.dropped += 1;
    }
    trace!(
        aged = report.aged,
        dropped = report.dropped,
        remaining = graph.len(),
        "eviction sweep"
    );
    report
}
