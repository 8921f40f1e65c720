use std::io::{self, Write};

use super::SweepPoint;
use crate::{simulator::Simulator, types::Timestamp};

/// The header line of the CSV produced by `write_csv`.
pub const CSV_HEADER: &str =
    "block_size,bf_width,sparsity,num_workers,final_time,compute_time,network_time,rounds";

/// The outcome of a single simulation in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub block_size: usize,
    pub bf_width: usize,
    pub sparsity: f32,
    pub num_workers: usize,
    pub final_time: Timestamp,
    pub compute_time: u64,
    pub network_time: u64,
    pub rounds: u64,
}

impl Report {
    /// Collects the results of a finished simulation.
    ///
    /// # Arguments
    /// * `point` - The parameters the simulation ran with.
    /// * `sim` - The finished simulation.
    pub fn new(point: SweepPoint, sim: &Simulator) -> Self {
        let stats = sim.stats();

        Self {
            block_size: point.block_size,
            bf_width: point.bf_width,
            sparsity: point.sparsity,
            num_workers: point.num_workers,
            final_time: sim.get_time(),
            compute_time: stats.compute_time,
            network_time: stats.network_time,
            rounds: stats.rounds,
        }
    }

    fn write_row<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            self.block_size,
            self.bf_width,
            self.sparsity,
            self.num_workers,
            self.final_time,
            self.compute_time,
            self.network_time,
            self.rounds
        )
    }
}

/// Writes `reports` as comma separated values, header first.
///
/// # Arguments
/// * `out` - Where to write to.
/// * `reports` - The rows to write.
pub fn write_csv<W: Write>(mut out: W, reports: &[Report]) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;

    for report in reports {
        report.write_row(&mut out)?;
    }

    out.flush()
}
