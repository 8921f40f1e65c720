use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde::Deserialize;

use super::DataGen;
use crate::{
    error::{Result, SimErr},
    types::WorkerId,
};

/// The unit that is zeroed out as a whole.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Every element is independently zero.
    #[default]
    Element,
    /// Every block is independently all zero.
    Block,
}

/// Creates the random number generator of a worker.
///
/// # Arguments
/// * `seed` - The base seed of the run, `None` draws from the OS.
/// * `worker_id` - The worker the generator is for.
///
/// # Returns
/// A generator that is reproducible whenever a seed is provided.
pub fn worker_rng(seed: Option<u64>, worker_id: WorkerId) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
        None => StdRng::from_os_rng(),
    }
}

/// A data generator where each element (or block) is zero with probability `sparsity`
/// and otherwise uniformly distributed in `[0, 1)`.
pub struct SparseDataGen<R: Rng> {
    rng: R,
    zero: Bernoulli,
    value: Uniform<f32>,
    chunk: usize,
}

impl<R: Rng> SparseDataGen<R> {
    /// Creates a new `SparseDataGen` data generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `sparsity` - The probability of an element or block being zero.
    /// * `granularity` - Whether elements or whole blocks are zeroed.
    /// * `block_size` - The amount of elements per block.
    ///
    /// # Returns
    /// An `InvalidSparsity` error if `sparsity` is outside `[0, 1]`.
    pub fn new(
        rng: R,
        sparsity: f32,
        granularity: Granularity,
        block_size: usize,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&sparsity) {
            return Err(SimErr::InvalidSparsity(sparsity));
        }

        let zero = Bernoulli::new(sparsity as f64).map_err(|e| SimErr::Distribution(e.to_string()))?;
        let value = Uniform::new(0., 1.).map_err(|e| SimErr::Distribution(e.to_string()))?;
        let chunk = match granularity {
            Granularity::Element => 1,
            Granularity::Block => block_size.max(1),
        };

        Ok(Self {
            rng,
            zero,
            value,
            chunk,
        })
    }
}

impl<R: Rng> DataGen for SparseDataGen<R> {
    fn generate(&mut self, size: usize) -> Vec<f32> {
        let mut data = vec![0.; size];

        for chunk in data.chunks_mut(self.chunk) {
            if self.zero.sample(&mut self.rng) {
                continue;
            }

            chunk
                .iter_mut()
                .for_each(|x| *x = self.value.sample(&mut self.rng));
        }

        data
    }
}
