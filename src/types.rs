/// Index of a block inside a gradient buffer.
pub type BlockId = usize;

/// Index of a worker, in `0..num_workers`.
pub type WorkerId = usize;

/// A point in simulated time.
pub type Timestamp = u64;

/// A span of simulated time returned by every protocol step.
pub type TimeDelta = u64;

/// The delta of a step that didn't happen.
pub const TIME_NOW: TimeDelta = 0;
