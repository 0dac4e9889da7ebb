//! los-panel Hardware Abstraction Layer
//!
//! This crate defines the serial link traits the host tooling is written
//! against. A concrete port (USB CDC, FTDI, a test double) implements them,
//! which keeps the staging and capture logic independent of the transport.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (lospanel-host)            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lospanel-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  SerialLink   │       │   MockLink    │
//! │ (serialport)  │       │   (tests)     │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{DataBits, Parity, SerialConfig, StopBits, UartRx, UartTx};
