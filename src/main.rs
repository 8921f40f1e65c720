use std::{env, fs, io};

use anyhow::{Context, bail};
use log::info;

use sparse_allreduce_sim::sweep::{self, SweepSpec};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        bail!("usage: sparse-allreduce-sim <sweep.json>");
    };

    let content = fs::read_to_string(&path).with_context(|| format!("cannot read '{path}'"))?;
    let spec: SweepSpec =
        serde_json::from_str(&content).with_context(|| format!("invalid sweep '{path}'"))?;

    info!("running {} simulations from {path}", spec.len());
    let reports = sweep::run_sweep(&spec)?;

    sweep::write_csv(io::stdout().lock(), &reports)?;
    Ok(())
}
