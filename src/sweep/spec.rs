use serde::Deserialize;

use crate::{config::Validation, cost::CostModel, data::Granularity};

/// A grid of simulations, one per combination of the listed parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SweepSpec {
    pub num_workers: Vec<usize>,
    pub block_sizes: Vec<usize>,
    pub bf_widths: Vec<usize>,
    pub sparsities: Vec<f32>,
    /// The amount of gradient elements per worker.
    pub data_size: usize,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub cost: CostModel,
    #[serde(default)]
    pub validation: Validation,
}

/// A single combination of a `SweepSpec`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub num_workers: usize,
    pub block_size: usize,
    pub bf_width: usize,
    pub sparsity: f32,
}

impl SweepSpec {
    /// Returns the amount of simulations in the grid.
    pub fn len(&self) -> usize {
        self.num_workers.len() * self.block_sizes.len() * self.bf_widths.len() * self.sparsities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands the grid, block size varying slowest and worker count fastest.
    pub fn points(&self) -> Vec<SweepPoint> {
        let mut points = Vec::with_capacity(self.len());

        for &block_size in &self.block_sizes {
            for &sparsity in &self.sparsities {
                for &bf_width in &self.bf_widths {
                    for &num_workers in &self.num_workers {
                        points.push(SweepPoint {
                            num_workers,
                            block_size,
                            bf_width,
                            sparsity,
                        });
                    }
                }
            }
        }

        points
    }
}
