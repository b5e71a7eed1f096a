//! Per-symbol in-memory history of volume-weighted prices, bounded so the
//! working set stays flat regardless of how long the process runs (§4.2).

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;

/// Capacity of one symbol's vw_price ring: 720 samples, i.e. 12h at 1/min.
pub const RING_CAPACITY: usize = 720;

/// Fixed-capacity ring of the most recent `vw_price` samples for one symbol.
#[derive(Debug, Clone, Default)]
pub struct PegRing {
    samples: std::collections::VecDeque<Decimal>,
}

impl PegRing {
    pub fn push(&mut self, vw_price: Decimal) {
        if self.samples.len() == RING_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(vw_price);
    }

    pub fn samples(&self) -> &std::collections::VecDeque<Decimal> {
        &self.samples
    }

    /// Last `n` samples, oldest first. Fewer than `n` if the ring isn't full yet.
    pub fn tail(&self, n: usize) -> Vec<Decimal> {
        let len = self.samples.len();
        let skip = len.saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }
}

/// Owns one `PegRing` per symbol behind a single lock; adapters/composers
/// never see the lock directly, only `with_ring`.
#[derive(Debug, Default)]
pub struct PegRingStore {
    rings: RwLock<HashMap<String, PegRing>>,
}

impl PegRingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `vw_price` to the symbol's ring and returns the ring's tail
    /// (most recent `window` samples, oldest first) for downstream stats.
    pub fn push_and_tail(&self, symbol: &str, vw_price: Decimal, window: usize) -> Vec<Decimal> {
        let mut rings = self.rings.write();
        let ring = rings.entry(symbol.to_string()).or_default();
        ring.push(vw_price);
        ring.tail(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ring_evicts_oldest_once_full() {
        let mut ring = PegRing::default();
        for i in 0..(RING_CAPACITY + 5) {
            ring.push(Decimal::from(i));
        }
        assert_eq!(ring.samples().len(), RING_CAPACITY);
        assert_eq!(*ring.samples().front().unwrap(), Decimal::from(5));
    }

    #[test]
    fn tail_returns_fewer_than_requested_when_not_full() {
        let mut ring = PegRing::default();
        ring.push(dec!(1));
        ring.push(dec!(2));
        assert_eq!(ring.tail(60), vec![dec!(1), dec!(2)]);
    }
}
