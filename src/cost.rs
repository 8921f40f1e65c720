use serde::Deserialize;

use crate::types::TimeDelta;

/// Time to copy or add a single gradient element.
pub const COPY_PER_ELEMENT: TimeDelta = 1;

/// Time to inspect a single element while scanning ahead for a nonzero block.
pub const SCAN_PER_ELEMENT: TimeDelta = 1;

/// Time to put a single gradient element on the wire.
pub const NETWORK_PER_ELEMENT: TimeDelta = 4;

/// Fixed time for a message to cross the network.
pub const NETWORK_LATENCY: TimeDelta = 1000;

/// Time spent per fusion column on bookkeeping, regardless of its payload.
pub const COLUMN_OVERHEAD: TimeDelta = 2;

/// A linear cost model, every step costs a fixed overhead plus a per-element term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub copy_per_element: TimeDelta,
    pub scan_per_element: TimeDelta,
    pub network_per_element: TimeDelta,
    pub network_latency: TimeDelta,
    pub column_overhead: TimeDelta,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            copy_per_element: COPY_PER_ELEMENT,
            scan_per_element: SCAN_PER_ELEMENT,
            network_per_element: NETWORK_PER_ELEMENT,
            network_latency: NETWORK_LATENCY,
            column_overhead: COLUMN_OVERHEAD,
        }
    }
}

impl CostModel {
    /// The cost of absorbing a received packet, at a worker or at the aggregator.
    ///
    /// # Arguments
    /// * `valid` - The amount of valid blocks in the packet.
    /// * `block_size` - The amount of elements per block.
    /// * `bf_width` - The amount of columns in the packet.
    pub fn process(&self, valid: usize, block_size: usize, bf_width: usize) -> TimeDelta {
        self.columns(bf_width) + self.copy(valid, block_size)
    }

    /// The cost of filling a worker's send packet.
    ///
    /// # Arguments
    /// * `valid` - The amount of blocks copied into the packet.
    /// * `scanned` - The amount of elements inspected looking for the next nonzero blocks.
    /// * `block_size` - The amount of elements per block.
    /// * `bf_width` - The amount of columns in the packet.
    ///
    /// # Returns
    /// Zero if there is nothing to send.
    pub fn prepare(
        &self,
        valid: usize,
        scanned: usize,
        block_size: usize,
        bf_width: usize,
    ) -> TimeDelta {
        if valid == 0 {
            return 0;
        }

        self.columns(bf_width)
            + self.copy(valid, block_size)
            + scanned as TimeDelta * self.scan_per_element
    }

    /// The cost of the aggregator deciding which workers send in the next round.
    pub fn select(&self, num_workers: usize, bf_width: usize) -> TimeDelta {
        num_workers as TimeDelta * self.columns(bf_width)
    }

    /// The cost of putting a packet on the wire.
    ///
    /// # Arguments
    /// * `valid` - The amount of valid blocks in the packet.
    /// * `block_size` - The amount of elements per block.
    /// * `bf_width` - The amount of columns in the packet.
    pub fn transmit(&self, valid: usize, block_size: usize, bf_width: usize) -> TimeDelta {
        self.network_latency
            + self.columns(bf_width)
            + (valid * block_size) as TimeDelta * self.network_per_element
    }

    fn columns(&self, bf_width: usize) -> TimeDelta {
        bf_width as TimeDelta * self.column_overhead
    }

    fn copy(&self, valid: usize, block_size: usize) -> TimeDelta {
        (valid * block_size) as TimeDelta * self.copy_per_element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_prepare_is_free() {
        let cost = CostModel::default();
        assert_eq!(cost.prepare(0, 1024, 8, 4), 0);
    }

    #[test]
    fn overhead_plus_per_element() {
        let cost = CostModel {
            copy_per_element: 1,
            scan_per_element: 3,
            network_per_element: 5,
            network_latency: 100,
            column_overhead: 7,
        };

        assert_eq!(cost.process(2, 4, 3), 21 + 8);
        assert_eq!(cost.prepare(2, 10, 4, 3), 21 + 8 + 30);
        assert_eq!(cost.transmit(0, 4, 3), 100 + 21);
        assert_eq!(cost.transmit(2, 4, 3), 100 + 21 + 40);
        assert_eq!(cost.select(4, 3), 84);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cost: CostModel = serde_json::from_str(r#"{ "network_latency": 10 }"#).unwrap();

        assert_eq!(cost.network_latency, 10);
        assert_eq!(cost.copy_per_element, COPY_PER_ELEMENT);
    }
}
