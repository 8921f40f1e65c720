mod report;
mod spec;

use log::info;
use rayon::prelude::*;

pub use report::{CSV_HEADER, Report, write_csv};
pub use spec::{SweepPoint, SweepSpec};

use crate::{config::SimConfig, error::Result, simulator::Simulator};

/// Runs a single simulation of a sweep.
///
/// # Arguments
/// * `spec` - The sweep the point belongs to.
/// * `point` - The parameters to simulate.
///
/// # Returns
/// The simulation's report, or the configuration error that prevented it.
pub fn run_point(spec: &SweepSpec, point: SweepPoint) -> Result<Report> {
    let mut config = SimConfig::new(point.num_workers, point.block_size, point.bf_width)?
        .with_cost(spec.cost)
        .with_validation(spec.validation);
    config.seed = spec.seed;

    let mut sim = Simulator::with_config(config);
    sim.generate_data_with(spec.data_size, point.sparsity, spec.granularity)?;
    sim.run()?;

    info!(
        "block_size={} bf_width={} sparsity={} workers={} time={}",
        point.block_size,
        point.bf_width,
        point.sparsity,
        point.num_workers,
        sim.get_time()
    );

    Ok(Report::new(point, &sim))
}

/// Runs every point of `spec` in parallel.
///
/// # Returns
/// The reports in grid order, or the first configuration error found.
pub fn run_sweep(spec: &SweepSpec) -> Result<Vec<Report>> {
    spec.points()
        .into_par_iter()
        .map(|point| run_point(spec, point))
        .collect()
}
