use std::fmt::{self, Display};

use super::Block;
use crate::types::WorkerId;

/// The endpoint a packet was sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Worker(WorkerId),
    Broadcast,
}

impl Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Worker(id) => write!(f, "worker {id}"),
            Origin::Broadcast => f.write_str("the aggregator"),
        }
    }
}

/// The unit of transmission: one block per fusion column.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    blocks: Vec<Block>,
    origin: Origin,
}

impl Packet {
    /// Creates a new `Packet` of invalid blocks.
    ///
    /// # Arguments
    /// * `block_size` - The amount of elements per block.
    /// * `bf_width` - The amount of fused blocks.
    /// * `origin` - Who sends this packet.
    pub fn new(block_size: usize, bf_width: usize, origin: Origin) -> Self {
        Self {
            blocks: (0..bf_width).map(|_| Block::new(block_size)).collect(),
            origin,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Returns the amount of valid blocks in the packet.
    pub fn valid_blocks(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_valid()).count()
    }

    /// Returns whether there's nothing worth transmitting.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| !block.is_valid())
    }

    pub fn invalidate(&mut self) {
        self.blocks.iter_mut().for_each(Block::invalidate);
    }

    /// Invalidates every block and zeroes their payloads.
    pub fn clear(&mut self) {
        self.blocks.iter_mut().for_each(Block::clear);
    }

    /// Overwrites this packet with `other` without reallocating.
    ///
    /// # Panics
    /// If both packets don't have the same shape.
    pub(crate) fn copy_from(&mut self, other: &Packet) {
        assert_eq!(self.blocks.len(), other.blocks.len(), "packet width mismatch");

        self.origin = other.origin;
        self.blocks
            .iter_mut()
            .zip(&other.blocks)
            .for_each(|(dst, src)| dst.copy_from(src));
    }
}
