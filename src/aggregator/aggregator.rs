use log::{debug, trace};

use crate::{
    config::{SimConfig, Validation},
    cost::CostModel,
    error::{Result, SimErr},
    packet::{Origin, Packet, earliest},
    types::{BlockId, TimeDelta, WorkerId},
    worker::Worker,
};

/// The half of a round the aggregator is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Receiving and reducing the workers' packets.
    Collecting,
    /// Delivering the reduced packet to every worker.
    Broadcasting,
}

/// Reduces the workers' packets column by column and decides who sends next.
#[derive(Debug)]
pub struct Aggregator {
    num_workers: usize,
    block_size: usize,
    bf_width: usize,
    cost: CostModel,
    validation: Validation,
    recv: Vec<Packet>,
    send: Packet,
    // last next pointer reported by each worker, per column
    reported: Vec<Vec<Option<BlockId>>>,
    min_next: Vec<Option<BlockId>>,
    expected: usize,
    received: usize,
    sent: usize,
    phase: Phase,
}

impl Aggregator {
    /// Creates a new `Aggregator` expecting every worker in the first round.
    ///
    /// # Arguments
    /// * `config` - The configuration of the simulation.
    pub fn new(config: &SimConfig) -> Self {
        let num_workers = config.num_workers.get();
        let block_size = config.block_size.get();
        let bf_width = config.bf_width.get();

        Self {
            num_workers,
            block_size,
            bf_width,
            cost: config.cost,
            validation: config.validation,
            recv: (0..num_workers)
                .map(|id| Packet::new(block_size, bf_width, Origin::Worker(id)))
                .collect(),
            send: Packet::new(block_size, bf_width, Origin::Broadcast),
            reported: vec![vec![None; bf_width]; num_workers],
            min_next: vec![None; bf_width],
            expected: num_workers,
            received: 0,
            sent: 0,
            phase: Phase::Collecting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The amount of packets expected this round.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// The smallest next pointer per column, the blocks to ask for next.
    pub fn min_next(&self) -> &[Option<BlockId>] {
        &self.min_next
    }

    /// The packet being reduced or broadcast this round.
    pub fn send_packet(&self) -> &Packet {
        &self.send
    }

    /// Stores a worker's packet in that worker's receive slot.
    ///
    /// # Returns
    /// An error if the packet doesn't come from one of the configured workers.
    pub fn receive_packet(&mut self, packet: &Packet) -> Result<()> {
        let worker_id = match packet.origin() {
            Origin::Worker(id) if id < self.num_workers => id,
            Origin::Worker(id) => {
                return Err(SimErr::WorkerOutOfRange {
                    worker_id: id,
                    num_workers: self.num_workers,
                });
            }
            Origin::Broadcast => {
                return Err(SimErr::UnexpectedOrigin {
                    expected: "a worker",
                    got: Origin::Broadcast,
                });
            }
        };

        self.validation.check(self.phase == Phase::Collecting, || {
            format!("packet from worker {worker_id} arrived before the previous round drained")
        });

        self.recv[worker_id].copy_from(packet);
        Ok(())
    }

    /// Adds the stored packet of `worker_id` into the outgoing packet and lowers the
    /// column minima with its next pointers.
    ///
    /// # Arguments
    /// * `worker_id` - The worker whose packet to reduce.
    ///
    /// # Returns
    /// The time spent reducing.
    ///
    /// # Panics
    /// If `worker_id` is out of range.
    pub fn process_response(&mut self, worker_id: WorkerId) -> TimeDelta {
        let mut valid = 0;

        for (column, block) in self.recv[worker_id].blocks().iter().enumerate() {
            let Some(id) = block.id() else {
                continue;
            };

            self.validation.check(id % self.bf_width == column, || {
                format!("worker {worker_id} sent block {id} in column {column}")
            });

            let out = &mut self.send.blocks_mut()[column];
            match out.id() {
                Some(current) => self.validation.check(current == id, || {
                    format!(
                        "worker {worker_id} sent block {id} in column {column}, others sent {current}"
                    )
                }),
                None => out.claim(id),
            }
            out.accumulate(block.data());

            self.reported[worker_id][column] = block.next();
            self.min_next[column] = earliest(self.min_next[column], block.next());
            valid += 1;
        }

        self.received += 1;
        self.validation.check(self.received <= self.expected, || {
            format!(
                "received {} packets, only {} were expected",
                self.received, self.expected
            )
        });

        trace!("aggregator reduced {valid} blocks from worker {worker_id}");

        self.cost.process(valid, self.block_size, self.bf_width)
    }

    /// Selects, per column, the workers whose next block is the column minimum and
    /// tags the outgoing blocks with that minimum.
    ///
    /// # Returns
    /// The time spent selecting.
    pub fn prepare_to_send(&mut self) -> TimeDelta {
        self.validation.check(self.all_received(), || {
            format!(
                "preparing after {} of {} packets",
                self.received, self.expected
            )
        });

        let mut selected = vec![false; self.num_workers];

        for column in 0..self.bf_width {
            let min = self.min_next[column];
            let mut following = None;

            for (worker_id, reported) in self.reported.iter_mut().enumerate() {
                let next = reported[column];

                if min.is_some() && next == min {
                    selected[worker_id] = true;
                    reported[column] = None;
                } else {
                    self.validation.check(earliest(next, min) == min, || {
                        format!("worker {worker_id} reported {next:?} below the minimum {min:?}")
                    });
                    following = earliest(following, next);
                }
            }

            let out = &mut self.send.blocks_mut()[column];
            self.validation.check(out.is_valid() || min.is_none(), || {
                format!("column {column} requests {min:?} without contributors")
            });
            out.set_next(min);

            self.min_next[column] = following;
        }

        self.send.set_origin(Origin::Broadcast);
        self.expected = selected.into_iter().filter(|&s| s).count();
        self.received = 0;
        self.sent = 0;
        self.phase = Phase::Broadcasting;

        debug!(
            "aggregator broadcasting {} blocks, {} workers expected next round",
            self.send.valid_blocks(),
            self.expected
        );

        self.cost.select(self.num_workers, self.bf_width)
    }

    /// Delivers the reduced packet to `worker`.
    ///
    /// # Returns
    /// The time spent on the wire, or an error if the worker rejects the packet.
    pub fn send(&mut self, worker: &mut Worker) -> Result<TimeDelta> {
        self.validation.check(self.phase == Phase::Broadcasting, || {
            format!("sending to worker {} while collecting", worker.id())
        });

        worker.receive_packet(&self.send)?;
        self.sent += 1;

        let valid = self.send.valid_blocks();
        Ok(self.cost.transmit(valid, self.block_size, self.bf_width))
    }

    /// Invalidates and zeroes the outgoing packet, ready for the next round.
    pub fn reset(&mut self) {
        self.validation.check(self.all_sent(), || {
            format!(
                "resetting after sending to {} of {} workers",
                self.sent, self.num_workers
            )
        });

        self.send.clear();
        self.sent = 0;
        self.phase = Phase::Collecting;
    }

    /// Returns whether every packet expected this round has been received.
    pub fn all_received(&self) -> bool {
        self.received == self.expected
    }

    /// Returns whether every worker got this round's broadcast.
    pub fn all_sent(&self) -> bool {
        self.sent == self.num_workers
    }

    /// Returns whether no worker will send again.
    ///
    /// This is the one place where "every column minimum is absent" and "nobody is
    /// expected next round" are tied together.
    pub fn is_done(&self) -> bool {
        let done = self.phase == Phase::Collecting && self.expected == 0;

        self.validation
            .check(!done || self.min_next.iter().all(Option::is_none), || {
                format!("no worker expected while columns still wait on {:?}", self.min_next)
            });

        done
    }
}
