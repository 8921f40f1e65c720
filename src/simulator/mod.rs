mod simulator;
mod stats;

pub use simulator::Simulator;
pub use stats::SimStats;
