use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::{packet::Origin, types::WorkerId};

/// The result type used across the simulator.
pub type Result<T> = std::result::Result<T, SimErr>;

/// Configuration errors, surfaced to the caller before the simulation proceeds.
///
/// Protocol invariant violations are not represented here, they abort instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SimErr {
    ZeroParameter {
        name: &'static str,
    },
    InvalidSparsity(f32),
    EmptyData,
    SizeNotAligned {
        size: usize,
        block_size: usize,
    },
    DataLengthMismatch {
        worker_id: WorkerId,
        got: usize,
        expected: usize,
    },
    WorkerCountMismatch {
        got: usize,
        expected: usize,
    },
    WorkerOutOfRange {
        worker_id: WorkerId,
        num_workers: usize,
    },
    UnexpectedOrigin {
        expected: &'static str,
        got: Origin,
    },
    DataNotGenerated,
    AlreadyRan,
    Distribution(String),
}

impl Display for SimErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimErr::ZeroParameter { name } => write!(f, "{name} must be greater than zero"),
            SimErr::InvalidSparsity(sparsity) => {
                write!(f, "sparsity must be between 0 and 1, got {sparsity}")
            }
            SimErr::EmptyData => f.write_str("data size must be positive"),
            SimErr::SizeNotAligned { size, block_size } => write!(
                f,
                "data size {size} is not a multiple of the block size {block_size}"
            ),
            SimErr::DataLengthMismatch {
                worker_id,
                got,
                expected,
            } => write!(
                f,
                "data length mismatch for worker {worker_id}: got {got}, expected {expected}"
            ),
            SimErr::WorkerCountMismatch { got, expected } => write!(
                f,
                "got data for {got} workers, the simulation has {expected}"
            ),
            SimErr::WorkerOutOfRange {
                worker_id,
                num_workers,
            } => write!(
                f,
                "invalid worker number {worker_id}, there are {num_workers} workers"
            ),
            SimErr::UnexpectedOrigin { expected, got } => {
                write!(f, "expected a packet from {expected}, got one from {got}")
            }
            SimErr::DataNotGenerated => f.write_str("data must be generated before running"),
            SimErr::AlreadyRan => f.write_str("the simulation has already run to completion"),
            SimErr::Distribution(e) => write!(f, "invalid data distribution: {e}"),
        }
    }
}

impl Error for SimErr {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = SimErr::SizeNotAligned {
            size: 10,
            block_size: 4,
        };
        assert_eq!(
            err.to_string(),
            "data size 10 is not a multiple of the block size 4"
        );

        let err = SimErr::UnexpectedOrigin {
            expected: "the aggregator",
            got: Origin::Worker(3),
        };
        assert_eq!(
            err.to_string(),
            "expected a packet from the aggregator, got one from worker 3"
        );
    }
}
