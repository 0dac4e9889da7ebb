//! Background threads
//!
//! Each task owns its half of the link and reports through a channel.

pub mod ack_reader;

pub use ack_reader::{spawn_ack_reader, AckReader, LineAssembler};
