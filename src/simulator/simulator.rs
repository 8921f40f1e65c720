use log::{info, trace};

use crate::{
    aggregator::Aggregator,
    config::SimConfig,
    data::{Granularity, SparseDataGen, worker_rng},
    error::{Result, SimErr},
    event::{Event, EventKind, EventQueue},
    simulator::SimStats,
    types::{TIME_NOW, TimeDelta, Timestamp},
    worker::Worker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NoData,
    Ready,
    Finished,
}

/// Drives the workers and the aggregator through the round protocol on a single
/// event queue until no worker has anything left to send.
#[derive(Debug)]
pub struct Simulator {
    config: SimConfig,
    workers: Vec<Worker>,
    aggregator: Aggregator,
    events: EventQueue,
    time: Timestamp,
    // when the latest reduction of the current round completes
    reduced_at: Timestamp,
    stats: SimStats,
    state: State,
}

impl Simulator {
    /// Creates a new `Simulator` with the default cost model and strict validation.
    ///
    /// # Arguments
    /// * `num_workers` - The amount of workers synchronizing their gradients.
    /// * `block_size` - The amount of elements per block.
    /// * `bf_width` - The amount of blocks fused into a single packet.
    ///
    /// # Returns
    /// A `ZeroParameter` error if any of the counts is zero.
    pub fn new(num_workers: usize, block_size: usize, bf_width: usize) -> Result<Self> {
        SimConfig::new(num_workers, block_size, bf_width).map(Self::with_config)
    }

    /// Creates a new `Simulator` from a full configuration.
    pub fn with_config(config: SimConfig) -> Self {
        let workers = (0..config.num_workers.get())
            .map(|id| Worker::new(id, &config))
            .collect();
        let aggregator = Aggregator::new(&config);

        Self {
            config,
            workers,
            aggregator,
            events: EventQueue::new(),
            time: 0,
            reduced_at: 0,
            stats: SimStats::default(),
            state: State::NoData,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Returns the global timestamp reached, the duration of the allreduce once run.
    pub fn get_time(&self) -> Timestamp {
        self.time
    }

    /// Generates every worker's gradient, each element zero with probability `sparsity`.
    ///
    /// # Arguments
    /// * `size` - The length of each gradient, a positive multiple of the block size.
    /// * `sparsity` - The probability of an element being zero.
    ///
    /// # Returns
    /// An error if the arguments are invalid or the simulation already ran.
    pub fn generate_data(&mut self, size: usize, sparsity: f32) -> Result<()> {
        self.generate_data_with(size, sparsity, Granularity::Element)
    }

    /// Same as `generate_data` choosing whether elements or whole blocks are zeroed.
    pub fn generate_data_with(
        &mut self,
        size: usize,
        sparsity: f32,
        granularity: Granularity,
    ) -> Result<()> {
        self.check_not_ran()?;
        self.config.check_data_size(size)?;

        let block_size = self.config.block_size.get();
        for worker in &mut self.workers {
            let rng = worker_rng(self.config.seed, worker.id());
            let mut data_gen = SparseDataGen::new(rng, sparsity, granularity, block_size)?;
            worker.generate_data_with(size, &mut data_gen)?;
        }

        self.state = State::Ready;
        Ok(())
    }

    /// Installs a given gradient on every worker.
    ///
    /// # Arguments
    /// * `data` - One buffer per worker, all of the same block aligned length.
    ///
    /// # Returns
    /// An error if there isn't one buffer per worker, their lengths differ or aren't
    /// block aligned, or the simulation already ran.
    pub fn load_data(&mut self, data: Vec<Vec<f32>>) -> Result<()> {
        self.check_not_ran()?;

        if data.len() != self.workers.len() {
            return Err(SimErr::WorkerCountMismatch {
                got: data.len(),
                expected: self.workers.len(),
            });
        }

        let size = data.first().map_or(0, Vec::len);
        self.config.check_data_size(size)?;

        if let Some((worker_id, buf)) = data.iter().enumerate().find(|(_, buf)| buf.len() != size) {
            return Err(SimErr::DataLengthMismatch {
                worker_id,
                got: buf.len(),
                expected: size,
            });
        }

        for (worker, buf) in self.workers.iter_mut().zip(data) {
            worker.load_data(buf)?;
        }

        self.state = State::Ready;
        Ok(())
    }

    fn check_not_ran(&self) -> Result<()> {
        match self.state {
            State::Finished => Err(SimErr::AlreadyRan),
            _ => Ok(()),
        }
    }

    /// Runs the allreduce until the event queue drains.
    ///
    /// # Returns
    /// An error if no data was provided, the simulation already ran, or a packet
    /// reached an endpoint it doesn't belong to.
    ///
    /// # Panics
    /// On a protocol invariant violation when validation is strict.
    pub fn run(&mut self) -> Result<()> {
        match self.state {
            State::NoData => return Err(SimErr::DataNotGenerated),
            State::Finished => return Err(SimErr::AlreadyRan),
            State::Ready => {}
        }

        info!(
            "running allreduce: workers={} block_size={} bf_width={} size={}",
            self.config.num_workers,
            self.config.block_size,
            self.config.bf_width,
            self.workers[0].gradients().len()
        );

        self.events.schedule(Event::new(EventKind::Init, 0, 0));

        while let Some(event) = self.events.pop_earliest() {
            self.config.validation.check(event.end >= self.time, || {
                format!("clock went back from {} to {}", self.time, event.end)
            });

            self.time = event.end;
            self.stats.bump_event();
            self.dispatch(event)?;
        }

        self.config.validation.check(
            self.aggregator.is_done() && self.workers.iter().all(Worker::is_exhausted),
            || format!("event queue drained at {} with blocks left", self.time),
        );

        self.state = State::Finished;
        info!(
            "allreduce finished: time={} rounds={} events={}",
            self.time, self.stats.rounds, self.stats.events
        );

        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        trace!("t={} {:?}", self.time, event.kind);

        if let Some(id) = event.kind.worker_id() {
            self.config.validation.check(
                self.workers.get(id).is_some_and(|worker| worker.id() == id),
                || format!("event {:?} names an unknown worker", event.kind),
            );
        }

        match event.kind {
            EventKind::Init => {
                for id in 0..self.workers.len() {
                    self.schedule(EventKind::WorkerPrepare(id), TIME_NOW);
                }
            }
            EventKind::WorkerPrepare(id) => {
                let worker = &mut self.workers[id];
                let delta = worker.prepare_to_send();
                self.stats.add_compute(delta);

                if !worker.send_packet().is_empty() {
                    self.schedule(EventKind::WorkerSend(id), delta);
                } else {
                    self.config.validation.check(delta == TIME_NOW, || {
                        format!("worker {id} spent {delta} preparing nothing")
                    });
                }
            }
            EventKind::WorkerSend(id) => {
                let worker = &self.workers[id];
                let delta = worker.send(&mut self.aggregator)?;
                self.stats.add_network(delta);
                self.stats
                    .add_worker_packet(worker.send_packet().valid_blocks());

                self.schedule(EventKind::AggregatorProcess(id), delta);
            }
            EventKind::AggregatorProcess(id) => {
                let delta = self.aggregator.process_response(id);
                self.stats.add_compute(delta);
                self.reduced_at = self.reduced_at.max(self.time + delta);

                if self.aggregator.all_received() {
                    self.schedule(EventKind::AggregatorPrepare, self.reduced_at - self.time);
                }
            }
            EventKind::AggregatorPrepare => {
                let delta = self.aggregator.prepare_to_send();
                self.stats.add_compute(delta);
                self.stats
                    .bump_round(self.aggregator.send_packet().valid_blocks());

                for id in 0..self.workers.len() {
                    self.schedule(EventKind::AggregatorSend(id), delta);
                }
            }
            EventKind::AggregatorSend(id) => {
                let delta = self.aggregator.send(&mut self.workers[id])?;
                self.stats.add_network(delta);
                self.schedule(EventKind::WorkerProcess(id), delta);

                if self.aggregator.all_sent() {
                    self.aggregator.reset();
                }
            }
            EventKind::WorkerProcess(id) => {
                let delta = self.workers[id].process_response();
                self.stats.add_compute(delta);
                self.schedule(EventKind::WorkerPrepare(id), delta);
            }
        }

        Ok(())
    }

    fn schedule(&mut self, kind: EventKind, delta: TimeDelta) {
        self.events
            .schedule(Event::new(kind, self.time, self.time + delta));
    }
}
