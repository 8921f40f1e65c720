mod block;
mod packet;

pub use block::{Block, earliest};
pub use packet::{Origin, Packet};
