//! Smoke tests: deterministic payloads and the runners that send them

pub mod payload;
pub mod runner;

pub use payload::{
    build_fill_burst, build_probe_sequence, build_stress_burst, hex_dump, ProbeSequence,
};
pub use runner::{run_capture, run_probe, CaptureOptions, CaptureReport, ProbeOptions};
