//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are microseconds from a process-local monotonic epoch
//! - A process-wide generator guarantees strictly increasing values
//! - The zero timestamp is the reserved *invalid* sentinel

mod blueprint;
mod calculator;
mod context;
mod error;
mod packet;
mod port;
mod tag;
mod timestamp;

pub use blueprint::*;
pub use calculator::Calculator;
pub use context::{CalculatorContext, SideParameters};
pub use error::GraphError;
pub use packet::Packet;
pub use port::{Port, PortHandle, DEFAULT_PORT_CAPACITY};
pub use tag::{Tag, TAG_INPUT, TAG_OUTPUT};
pub use timestamp::{next_timestamp, Timestamp};
