mod event;
mod queue;

pub use event::{Event, EventKind};
pub use queue::EventQueue;
