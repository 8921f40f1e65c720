use std::{fmt, num::NonZeroUsize};

use serde::Deserialize;

use crate::{
    cost::CostModel,
    error::{Result, SimErr},
};

/// How much of the protocol's invariants get checked while simulating.
///
/// `Strict` aborts on the first violation of:
/// * column alignment of every prepared and aggregated block,
/// * a single block id per column among the contributors of a round,
/// * round ordering (preparing before every packet arrived, broadcasting
///   outside the broadcast phase, ingesting before the previous round drained,
///   resetting before every worker got the broadcast, receiving more packets
///   than expected),
/// * strictly increasing skip pointers,
/// * a monotonic clock,
/// * the completion predicate once the event queue drains.
///
/// `Fast` trusts all of the above. Configuration errors are always reported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    #[default]
    Strict,
    Fast,
}

impl Validation {
    /// Aborts with `msg` if this mode is strict and `cond` doesn't hold.
    ///
    /// # Arguments
    /// * `cond` - The invariant to check.
    /// * `msg` - Lazily builds the description of the violation.
    ///
    /// # Panics
    /// If the mode is strict and the invariant is violated.
    #[inline]
    #[track_caller]
    pub fn check<M, F>(self, cond: bool, msg: F)
    where
        M: fmt::Display,
        F: FnOnce() -> M,
    {
        if self == Validation::Strict && !cond {
            panic!("protocol invariant violated: {}", msg());
        }
    }

    /// Returns whether invariants are checked.
    pub fn is_strict(self) -> bool {
        self == Validation::Strict
    }
}

/// The immutable parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimConfig {
    pub num_workers: NonZeroUsize,
    pub block_size: NonZeroUsize,
    pub bf_width: NonZeroUsize,
    #[serde(default)]
    pub cost: CostModel,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimConfig {
    /// Creates a new `SimConfig` with the default cost model and strict validation.
    ///
    /// # Arguments
    /// * `num_workers` - The amount of workers synchronizing their gradients.
    /// * `block_size` - The amount of elements per block.
    /// * `bf_width` - The amount of blocks fused into a single packet.
    ///
    /// # Returns
    /// A `ZeroParameter` error if any of the counts is zero.
    pub fn new(num_workers: usize, block_size: usize, bf_width: usize) -> Result<Self> {
        let non_zero = |value, name| NonZeroUsize::new(value).ok_or(SimErr::ZeroParameter { name });

        Ok(Self {
            num_workers: non_zero(num_workers, "num_workers")?,
            block_size: non_zero(block_size, "block_size")?,
            bf_width: non_zero(bf_width, "bf_width")?,
            cost: CostModel::default(),
            validation: Validation::default(),
            seed: None,
        })
    }

    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that `size` is a valid gradient buffer length for this configuration.
    ///
    /// # Arguments
    /// * `size` - The amount of elements in each worker's buffer.
    ///
    /// # Returns
    /// An error if `size` is zero or not a multiple of the block size.
    pub fn check_data_size(&self, size: usize) -> Result<()> {
        check_data_size(size, self.block_size.get())
    }
}

/// Checks that `size` elements can be split in whole blocks of `block_size`.
///
/// # Returns
/// An `EmptyData` error if `size` is zero, `SizeNotAligned` if it isn't a multiple
/// of `block_size`.
pub fn check_data_size(size: usize, block_size: usize) -> Result<()> {
    if size == 0 {
        return Err(SimErr::EmptyData);
    }

    if size % block_size != 0 {
        return Err(SimErr::SizeNotAligned { size, block_size });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_counts() {
        assert_eq!(
            SimConfig::new(0, 4, 1),
            Err(SimErr::ZeroParameter {
                name: "num_workers"
            })
        );
        assert_eq!(
            SimConfig::new(1, 0, 1),
            Err(SimErr::ZeroParameter { name: "block_size" })
        );
        assert_eq!(
            SimConfig::new(1, 4, 0),
            Err(SimErr::ZeroParameter { name: "bf_width" })
        );
    }

    #[test]
    fn data_size_must_be_aligned() {
        let config = SimConfig::new(2, 4, 2).unwrap();

        assert!(config.check_data_size(8).is_ok());
        assert_eq!(config.check_data_size(0), Err(SimErr::EmptyData));
        assert_eq!(
            config.check_data_size(6),
            Err(SimErr::SizeNotAligned {
                size: 6,
                block_size: 4
            })
        );

        assert!(check_data_size(21, 7).is_ok());
        assert_eq!(
            check_data_size(20, 7),
            Err(SimErr::SizeNotAligned {
                size: 20,
                block_size: 7
            })
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{ "num_workers": 4, "block_size": 64, "bf_width": 16 }"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config, SimConfig::new(4, 64, 16).unwrap());
    }

    #[test]
    fn fast_mode_skips_checks() {
        Validation::Fast.check(false, || "never reported");
    }

    #[test]
    #[should_panic(expected = "protocol invariant violated: boom")]
    fn strict_mode_aborts() {
        Validation::Strict.check(false, || "boom");
    }
}
