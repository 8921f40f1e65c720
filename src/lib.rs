//! A discrete-event simulator of a sparse, block-fused allreduce.
//!
//! Workers synchronize their gradients through a central aggregator in rounds.
//! Gradients are split in blocks and the blocks are interleaved in `bf_width`
//! columns; each round every column carries at most one block, and all-zero blocks
//! are skipped by telling the aggregator where the next nonzero block of each column
//! is. The simulator answers how long the whole exchange takes under a linear cost
//! model.

pub mod aggregator;
pub mod config;
pub mod cost;
pub mod data;
pub mod error;
pub mod event;
pub mod packet;
pub mod simulator;
pub mod sweep;
pub mod types;
pub mod worker;

pub use aggregator::Aggregator;
pub use config::{SimConfig, Validation};
pub use cost::CostModel;
pub use error::{Result, SimErr};
pub use simulator::{SimStats, Simulator};
pub use worker::Worker;
