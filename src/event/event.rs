use crate::types::{Timestamp, WorkerId};

/// The protocol step an event triggers once it is dequeued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Kicks off the first round.
    Init,
    /// The worker fills its send packet.
    WorkerPrepare(WorkerId),
    /// The worker hands its packet to the aggregator.
    WorkerSend(WorkerId),
    /// The aggregator reduces the packet received from the worker.
    AggregatorProcess(WorkerId),
    /// The aggregator picks the workers for the next round.
    AggregatorPrepare,
    /// The aggregator delivers the reduced packet to the worker.
    AggregatorSend(WorkerId),
    /// The worker absorbs the reduced packet.
    WorkerProcess(WorkerId),
}

impl EventKind {
    /// Returns the worker this event refers to, if any.
    pub fn worker_id(self) -> Option<WorkerId> {
        match self {
            EventKind::Init | EventKind::AggregatorPrepare => None,
            EventKind::WorkerPrepare(id)
            | EventKind::WorkerSend(id)
            | EventKind::AggregatorProcess(id)
            | EventKind::AggregatorSend(id)
            | EventKind::WorkerProcess(id) => Some(id),
        }
    }
}

/// A scheduled protocol step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// When the step that produced this event started.
    pub start: Timestamp,
    /// When this event fires.
    pub end: Timestamp,
}

impl Event {
    pub fn new(kind: EventKind, start: Timestamp, end: Timestamp) -> Self {
        Self { kind, start, end }
    }
}
