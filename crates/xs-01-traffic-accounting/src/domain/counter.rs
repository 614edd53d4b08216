//! Inbound and outbound byte totals with read-and-reset sampling.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Bytes moved in each direction since the last drain.
///
/// Shared between every wrapped stream of the server. Adds and drains are
/// lock-free.
#[derive(Debug, Default)]
pub struct TrafficCounter {
    incoming: AtomicU64,
    outgoing: AtomicU64,
}

impl TrafficCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_incoming(&self, bytes: u64) {
        if bytes > 0 {
            self.incoming.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    pub fn add_outgoing(&self, bytes: u64) {
        if bytes > 0 {
            self.outgoing.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    /// Current inbound total without resetting it.
    pub fn incoming(&self) -> u64 {
        self.incoming.load(Ordering::Relaxed)
    }

    /// Current outbound total without resetting it.
    pub fn outgoing(&self) -> u64 {
        self.outgoing.load(Ordering::Relaxed)
    }

    /// Read and clear both totals.
    ///
    /// Returns `(incoming, outgoing)`.
    pub fn drain(&self) -> (u64, u64) {
        (
            self.incoming.swap(0, Ordering::AcqRel),
            self.outgoing.swap(0, Ordering::AcqRel),
        )
    }

    /// Drain both totals into a sample covering `interval`.
    pub fn sample(&self, interval: Duration) -> TrafficSample {
        let (incoming_bytes, outgoing_bytes) = self.drain();
        TrafficSample {
            incoming_bytes,
            outgoing_bytes,
            interval,
        }
    }
}

/// The traffic of one sampling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub incoming_bytes: u64,
    pub outgoing_bytes: u64,
    pub interval: Duration,
}

impl TrafficSample {
    /// Inbound kilobytes in the window (1 KB = 1024 bytes).
    pub fn incoming_kb(&self) -> f64 {
        self.incoming_bytes as f64 / 1024.0
    }

    /// Outbound kilobytes in the window (1 KB = 1024 bytes).
    pub fn outgoing_kb(&self) -> f64 {
        self.outgoing_bytes as f64 / 1024.0
    }

    /// Inbound kilobytes per second, zero for an empty interval.
    pub fn incoming_kb_per_sec(&self) -> f64 {
        per_second(self.incoming_kb(), self.interval)
    }

    /// Outbound kilobytes per second, zero for an empty interval.
    pub fn outgoing_kb_per_sec(&self) -> f64 {
        per_second(self.outgoing_kb(), self.interval)
    }
}

fn per_second(kb: f64, interval: Duration) -> f64 {
    let secs = interval.as_secs_f64();
    if secs > 0.0 {
        kb / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_sample_drains_counters() {
        let counter = TrafficCounter::new();
        counter.add_incoming(100);
        counter.add_incoming(250);

        let sample = counter.sample(Duration::from_secs(60));
        assert_eq!(sample.incoming_bytes, 350);
        assert!((sample.incoming_kb() - 350.0 / 1024.0).abs() < f64::EPSILON);

        let next = counter.sample(Duration::from_secs(60));
        assert_eq!(next.incoming_bytes, 0);
        assert_eq!(next.incoming_kb(), 0.0);
    }

    #[test]
    fn test_directions_are_independent() {
        let counter = TrafficCounter::new();
        counter.add_incoming(10);
        counter.add_outgoing(32);

        assert_eq!(counter.drain(), (10, 32));
        assert_eq!(counter.drain(), (0, 0));
    }

    #[test]
    fn test_rate_per_second() {
        let sample = TrafficSample {
            incoming_bytes: 2048,
            outgoing_bytes: 0,
            interval: Duration::from_secs(2),
        };
        assert!((sample.incoming_kb_per_sec() - 1.0).abs() < f64::EPSILON);

        let empty = TrafficSample {
            interval: Duration::ZERO,
            ..sample
        };
        assert_eq!(empty.incoming_kb_per_sec(), 0.0);
    }

    #[test]
    fn test_concurrent_adds_racing_drains_are_counted_once() {
        let counter = Arc::new(TrafficCounter::new());
        let drained = Arc::new(AtomicU64::new(0));

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        counter.add_incoming(1);
                    }
                })
            })
            .collect();

        let reader = {
            let counter = counter.clone();
            let drained = drained.clone();
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    drained.fetch_add(counter.drain().0, Ordering::Relaxed);
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        let total = drained.load(Ordering::Relaxed) + counter.drain().0;
        assert_eq!(total, 40_000);
    }

    proptest! {
        #[test]
        fn prop_sample_equals_sum_of_adds(adds in prop::collection::vec(0u64..10_000, 0..64)) {
            let counter = TrafficCounter::new();
            for n in &adds {
                counter.add_outgoing(*n);
            }
            let sample = counter.sample(Duration::from_secs(1));
            prop_assert_eq!(sample.outgoing_bytes, adds.iter().sum::<u64>());
            prop_assert_eq!(counter.outgoing(), 0);
        }
    }
}
