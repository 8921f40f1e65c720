use crate::types::TimeDelta;

/// Counters accumulated over a simulation run.
///
/// The time totals add up the cost of every step, overlapping steps of different
/// workers included, so they may exceed the final timestamp.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimStats {
    pub events: u64,
    pub rounds: u64,
    pub worker_packets: u64,
    pub blocks_sent: u64,
    pub blocks_broadcast: u64,

    pub compute_time: TimeDelta,
    pub network_time: TimeDelta,
}

impl SimStats {
    #[inline]
    pub fn bump_event(&mut self) {
        self.events += 1;
    }

    #[inline]
    pub fn bump_round(&mut self, blocks: usize) {
        self.rounds += 1;
        self.blocks_broadcast += blocks as u64;
    }

    #[inline]
    pub fn add_worker_packet(&mut self, blocks: usize) {
        self.worker_packets += 1;
        self.blocks_sent += blocks as u64;
    }

    #[inline]
    pub fn add_compute(&mut self, delta: TimeDelta) {
        self.compute_time += delta;
    }

    #[inline]
    pub fn add_network(&mut self, delta: TimeDelta) {
        self.network_time += delta;
    }
}
