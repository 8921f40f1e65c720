use log::trace;

use crate::{
    aggregator::Aggregator,
    config::{SimConfig, Validation, check_data_size},
    cost::CostModel,
    data::{DataGen, Granularity, SparseDataGen, worker_rng},
    error::{Result, SimErr},
    packet::{Origin, Packet},
    types::{BlockId, TimeDelta, WorkerId},
};

/// Owns one copy of the gradient and takes part in the sparse allreduce.
///
/// Each fusion column `i` tracks two pointers: the next nonzero block this worker
/// can contribute and the block the aggregator is asking for. A block is only sent
/// when both agree.
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    block_size: usize,
    bf_width: usize,
    cost: CostModel,
    validation: Validation,
    gradients: Vec<f32>,
    next_nonzero: Vec<Option<BlockId>>,
    requested: Vec<Option<BlockId>>,
    recv: Packet,
    send: Packet,
}

impl Worker {
    /// Creates a new `Worker` without data.
    ///
    /// # Arguments
    /// * `id` - The worker's identifier.
    /// * `config` - The configuration of the simulation.
    pub fn new(id: WorkerId, config: &SimConfig) -> Self {
        let block_size = config.block_size.get();
        let bf_width = config.bf_width.get();

        Self {
            id,
            block_size,
            bf_width,
            cost: config.cost,
            validation: config.validation,
            gradients: Vec::new(),
            next_nonzero: vec![None; bf_width],
            requested: vec![None; bf_width],
            recv: Packet::new(block_size, bf_width, Origin::Broadcast),
            send: Packet::new(block_size, bf_width, Origin::Worker(id)),
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn gradients(&self) -> &[f32] {
        &self.gradients
    }

    /// The next nonzero block this worker can send, per column.
    pub fn next_nonzero(&self) -> &[Option<BlockId>] {
        &self.next_nonzero
    }

    /// The block the aggregator asked for last, per column.
    pub fn requested(&self) -> &[Option<BlockId>] {
        &self.requested
    }

    /// Returns whether this worker has nothing left to contribute.
    pub fn is_exhausted(&self) -> bool {
        self.next_nonzero.iter().all(Option::is_none)
    }

    fn num_blocks(&self) -> usize {
        self.gradients.len() / self.block_size
    }

    /// Fills the gradient with `size` elements, each zero with probability `sparsity`
    /// and otherwise uniform in `[0, 1)`.
    ///
    /// # Arguments
    /// * `size` - The length of the gradient, a positive multiple of the block size.
    /// * `sparsity` - The probability of an element being zero.
    /// * `seed` - The base seed of the run, `None` draws from the OS.
    ///
    /// # Returns
    /// An error if `sparsity` is outside `[0, 1]` or `size` isn't block aligned.
    pub fn generate_data(&mut self, size: usize, sparsity: f32, seed: Option<u64>) -> Result<()> {
        let rng = worker_rng(seed, self.id);
        let mut data_gen = SparseDataGen::new(rng, sparsity, Granularity::Element, self.block_size)?;
        self.generate_data_with(size, &mut data_gen)
    }

    /// Fills the gradient with `size` elements drawn from `data_gen`.
    ///
    /// # Returns
    /// An error if `size` isn't a positive multiple of the block size.
    pub fn generate_data_with<G: DataGen>(&mut self, size: usize, data_gen: &mut G) -> Result<()> {
        check_data_size(size, self.block_size)?;
        self.load_data(data_gen.generate(size))
    }

    /// Replaces the gradient with `data` and rewinds the protocol state.
    ///
    /// Every column starts out requesting and offering its first block, so the
    /// first round carries the head of every column regardless of its contents.
    ///
    /// # Returns
    /// An error if the length of `data` isn't a positive multiple of the block size.
    pub fn load_data(&mut self, data: Vec<f32>) -> Result<()> {
        check_data_size(data.len(), self.block_size)?;
        self.gradients = data;

        let num_blocks = self.num_blocks();
        for column in 0..self.bf_width {
            let head = (column < num_blocks).then_some(column);
            self.next_nonzero[column] = head;
            self.requested[column] = head;
        }

        self.recv.invalidate();
        self.send.invalidate();
        Ok(())
    }

    /// Finds the next nonzero block in the same column as `requested`.
    ///
    /// # Arguments
    /// * `requested` - The last block asked for in this column.
    ///
    /// # Returns
    /// The id of the first block after `requested` in its column with at least one
    /// nonzero element, or `None` if the rest of the column is all zeros.
    pub fn find_nonzero(&self, requested: BlockId) -> Option<BlockId> {
        self.scan(requested).0
    }

    /// Same as `find_nonzero`, also returning the amount of elements inspected.
    fn scan(&self, requested: BlockId) -> (Option<BlockId>, usize) {
        let mut inspected = 0;

        for id in (requested + self.bf_width..self.num_blocks()).step_by(self.bf_width) {
            let start = id * self.block_size;
            let block = &self.gradients[start..start + self.block_size];

            match block.iter().position(|&x| x != 0.) {
                Some(pos) => return (Some(id), inspected + pos + 1),
                None => inspected += self.block_size,
            }
        }

        (None, inspected)
    }

    /// Stores the aggregator's broadcast in the receive slot.
    ///
    /// # Returns
    /// An `UnexpectedOrigin` error if `packet` doesn't come from the aggregator.
    pub fn receive_packet(&mut self, packet: &Packet) -> Result<()> {
        if packet.origin() != Origin::Broadcast {
            return Err(SimErr::UnexpectedOrigin {
                expected: "the aggregator",
                got: packet.origin(),
            });
        }

        self.recv.copy_from(packet);
        Ok(())
    }

    /// Copies the reduced blocks into the gradient and records what the aggregator
    /// asks for next in each column.
    ///
    /// # Returns
    /// The time spent absorbing the packet.
    pub fn process_response(&mut self) -> TimeDelta {
        let mut valid = 0;

        for (column, block) in self.recv.blocks().iter().enumerate() {
            if let Some(id) = block.id() {
                self.validation.check(id % self.bf_width == column, || {
                    format!("worker {} received block {id} in column {column}", self.id)
                });

                let start = id * self.block_size;
                self.gradients[start..start + self.block_size].copy_from_slice(block.data());
                valid += 1;
            }

            self.requested[column] = block.next();
        }

        trace!(
            "worker {} absorbed {valid} blocks, requested={:?}",
            self.id, self.requested
        );

        self.cost.process(valid, self.block_size, self.bf_width)
    }

    /// Fills the send packet with every block the aggregator asked for that this
    /// worker holds, and looks ahead for the following nonzero block of each.
    ///
    /// # Returns
    /// The time spent, zero if there is nothing to send this round.
    pub fn prepare_to_send(&mut self) -> TimeDelta {
        let mut valid = 0;
        let mut scanned = 0;

        for column in 0..self.bf_width {
            let id = match (self.next_nonzero[column], self.requested[column]) {
                (Some(next), Some(requested)) if next == requested => next,
                _ => {
                    self.send.blocks_mut()[column].invalidate();
                    continue;
                }
            };

            self.validation.check(id % self.bf_width == column, || {
                format!("worker {} prepared block {id} in column {column}", self.id)
            });

            let (next, inspected) = self.scan(id);
            self.validation.check(next.is_none_or(|next| next > id), || {
                format!("worker {} skip pointer went back from {id} to {next:?}", self.id)
            });

            let start = id * self.block_size;
            self.send.blocks_mut()[column].fill(
                id,
                next,
                &self.gradients[start..start + self.block_size],
            );
            self.next_nonzero[column] = next;

            valid += 1;
            scanned += inspected;
        }

        trace!(
            "worker {} prepared {valid} blocks, scanned {scanned} elements",
            self.id
        );

        self.cost
            .prepare(valid, scanned, self.block_size, self.bf_width)
    }

    /// Hands the send packet over to the aggregator.
    ///
    /// # Returns
    /// The time spent on the wire, or an error if the aggregator rejects the packet.
    pub fn send(&self, aggregator: &mut Aggregator) -> Result<TimeDelta> {
        aggregator.receive_packet(&self.send)?;

        let valid = self.send.valid_blocks();
        Ok(self.cost.transmit(valid, self.block_size, self.bf_width))
    }

    pub(crate) fn send_packet(&self) -> &Packet {
        &self.send
    }
}
