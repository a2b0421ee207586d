//! Scoped timers aggregated per label, compiled to no-ops unless the
//! `profiling` feature is enabled.

#[cfg(feature = "profiling")]
mod enabled {
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    use dashmap::DashMap;

    type Count = u64;
    type TotalNanos = u128;

    static STATS: OnceLock<DashMap<&'static str, (Count, TotalNanos)>> = OnceLock::new();

    #[inline]
    fn stats() -> &'static DashMap<&'static str, (Count, TotalNanos)> {
        STATS.get_or_init(DashMap::new)
    }

    /// Adds its lifetime to the label's total when dropped.
    pub struct Timer {
        label: &'static str,
        start: Instant,
    }

    impl Timer {
        /// Start timing `label`.
        #[inline]
        pub fn new(label: &'static str) -> Self {
            Timer {
                label,
                start: Instant::now(),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            record(self.label, self.start.elapsed());
        }
    }

    /// Add one measured call to `label`.
    pub fn record(label: &'static str, dur: Duration) {
        let mut entry = stats().entry(label).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += dur.as_nanos();
    }

    /// Print the collected totals, most expensive label first.
    pub fn report() {
        let mut rows: Vec<(&'static str, Count, TotalNanos, f64)> = stats()
            .iter()
            .map(|kv| {
                let (label, (count, total)) = (kv.key(), *kv.value());
                let avg_ns = if count == 0 {
                    0.0
                } else {
                    (total as f64) / (count as f64)
                };
                (*label, count, total, avg_ns)
            })
            .collect();

        rows.sort_by(|a, b| b.2.cmp(&a.2));

        println!("==== gramatch_subgraph search profile ====");
        for (label, count, total_ns, avg_ns) in rows {
            let total_ms = (total_ns as f64) / 1_000_000.0;
            println!(
                "{:<40} calls={:<10} total={:>9.3} ms avg= {:>12.1} ns",
                label, count, total_ms, avg_ns
            );
        }
        println!("==========================================");
    }
}

#[cfg(not(feature = "profiling"))]
mod disabled {
    use std::time::Duration;

    /// No-op timer.
    #[derive(Clone, Copy)]
    pub struct Timer;

    impl Timer {
        /// Start timing `label`.
        #[inline]
        pub fn new(_: &'static str) -> Self {
            Timer
        }
    }

    /// Add one measured call to `label`.
    pub fn record(_: &'static str, _: Duration) {}

    /// Print the collected totals.
    pub fn report() {}
}

#[cfg(feature = "profiling")]
pub use enabled::*;

#[cfg(not(feature = "profiling"))]
pub use disabled::*;
