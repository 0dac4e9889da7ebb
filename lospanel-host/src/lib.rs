//! los-panel host tooling
//!
//! Everything that needs `std`: the serial port, wall-clock time, threads,
//! configuration and the command line.
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │ clock driver │   │ smoke runner │──►│  ack reader  │ (thread)
//!   └──────┬───────┘   └──────┬───────┘   └──────▲───────┘
//!          │ ClockFace        │ payloads         │ UartRx
//!          ▼                  ▼                  │
//!   ┌─────────────────────────────────┐   ┌──────┴───────┐
//!   │ Stager (delays around commands) │──►│  SerialLink  │
//!   └─────────────────────────────────┘   └──────────────┘
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod serial;
pub mod smoke;
pub mod staging;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use clock::{ClockDriver, ClockOptions, SystemClock, WallClock};
pub use config::{ConfigError, HostConfig};
pub use serial::{LinkError, SerialLink};
pub use staging::{Stager, StagingPolicy, StdDelay};
