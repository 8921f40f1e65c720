mod data_gen;
mod sparse;

pub use data_gen::DataGen;
pub use sparse::{Granularity, SparseDataGen, worker_rng};
