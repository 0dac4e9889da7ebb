//! Smoke-test sequencing
//!
//! Capture order: settle, start the log reader, optional streaming mode,
//! payload, capture window, stop the reader, join with a bounded wait.

use std::fmt::Debug;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, warn};
use lospanel_hal::{UartRx, UartTx};
use lospanel_protocol::{Command, StreamingMode};

use super::payload::ProbeSequence;
use crate::serial::LinkError;
use crate::staging::{Stager, StagingPolicy};
use crate::tasks::spawn_ack_reader;

/// Firmware line confirming it saw host traffic
pub const DEFAULT_ACK_MARKER: &str = "raw: host active";

/// Firmware line printed once per boot
pub const DEFAULT_BOOT_MARKER: &str = "setup: serial online";

/// Reader sleep when no bytes are waiting
const READER_IDLE: Duration = Duration::from_millis(10);

/// Settle after a probe backlight command
const PROBE_BACKLIGHT_SETTLE: Duration = Duration::from_millis(50);

/// Settings for a capture run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Optional streaming mode sent before the payload
    pub streaming: Option<StreamingMode>,
    /// How long to keep reading after the payload
    pub capture: Duration,
    /// Upper bound on waiting for the reader to exit
    pub join_timeout: Duration,
    pub ack_marker: String,
    pub boot_marker: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            streaming: None,
            capture: Duration::from_millis(5000),
            join_timeout: Duration::from_millis(1000),
            ack_marker: DEFAULT_ACK_MARKER.to_string(),
            boot_marker: DEFAULT_BOOT_MARKER.to_string(),
        }
    }
}

/// What the firmware said during a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub lines: Vec<String>,
    /// The ack marker appeared in at least one line
    pub acknowledged: bool,
    /// Lines containing the boot marker
    pub boot_markers: usize,
}

impl CaptureReport {
    pub fn from_lines(lines: Vec<String>, ack_marker: &str, boot_marker: &str) -> Self {
        let acknowledged = lines.iter().any(|l| l.contains(ack_marker));
        let boot_markers = lines.iter().filter(|l| l.contains(boot_marker)).count();
        Self {
            lines,
            acknowledged,
            boot_markers,
        }
    }

    /// More than one boot banner means the board reset mid-run
    pub fn unexpected_reset(&self) -> bool {
        self.boot_markers > 1
    }

    /// Log the verdict; soft failures are warnings only
    pub fn log_verdict(&self, label: &str, options: &CaptureOptions) {
        info!("[{}] captured {} firmware lines", label, self.lines.len());
        if self.acknowledged {
            info!("[{}] firmware acknowledged host activity", label);
        } else {
            warn!(
                "[{}] no '{}' log observed; ensure the burst reached the device",
                label, options.ack_marker
            );
        }
        if self.unexpected_reset() {
            warn!(
                "[{}] saw '{}' {} times; the board may have reset during the run",
                label, options.boot_marker, self.boot_markers
            );
        }
    }
}

/// Send `payload` while capturing firmware output from `rx`
///
/// Transport errors abort the run. The reader is always stopped and joined
/// before returning.
pub fn run_capture<T, R, D>(
    tx: &mut T,
    rx: R,
    delay: &mut D,
    policy: &StagingPolicy,
    payload: &[u8],
    options: &CaptureOptions,
) -> Result<CaptureReport, LinkError>
where
    T: UartTx<Error = LinkError>,
    R: UartRx + Send + 'static,
    R::Error: Debug,
    D: DelayNs,
{
    let mut stager = Stager::new(tx, delay, policy);
    stager.settle();

    let reader = spawn_ack_reader(rx, READER_IDLE).map_err(LinkError::Reader)?;

    let sent = send_payload(&mut stager, payload, options);
    if sent.is_ok() {
        info!("capture window {:.1}s", options.capture.as_secs_f32());
        stager.pause(options.capture);
    }

    let lines = reader.stop_and_join(options.join_timeout);
    sent?;

    Ok(CaptureReport::from_lines(
        lines,
        &options.ack_marker,
        &options.boot_marker,
    ))
}

fn send_payload<T, D>(
    stager: &mut Stager<'_, T, D>,
    payload: &[u8],
    options: &CaptureOptions,
) -> Result<(), T::Error>
where
    T: UartTx,
    D: DelayNs,
{
    if let Some(mode) = options.streaming {
        stager.set_streaming_mode(mode)?;
    }
    info!("sending {} bytes", payload.len());
    stager.send_bytes(payload)
}

/// Settings for the glyph parity probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Optional backlight level sent before anything else
    pub backlight: Option<u8>,
    /// How long to keep the port open afterwards
    pub hold: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            backlight: None,
            hold: Duration::from_secs(2),
        }
    }
}

/// Send the probe, paced by the policy's chunk and slot delays
///
/// With both delays zero the whole probe is a single write.
pub fn run_probe<T, D>(
    tx: &mut T,
    delay: &mut D,
    policy: &StagingPolicy,
    probe: &ProbeSequence,
    options: &ProbeOptions,
) -> Result<(), T::Error>
where
    T: UartTx,
    D: DelayNs,
{
    let mut stager = Stager::new(tx, delay, policy);
    stager.settle();

    if let Some(level) = options.backlight {
        stager.send(&[Command::SetBacklight(level)])?;
        stager.pause(PROBE_BACKLIGHT_SETTLE);
    }

    let chunk_delay = policy.chunk_delay;
    let slot_delay = policy.slot_delay;
    info!(
        "sending {} bytes (chunk delay {:?}, slot delay {:?})",
        probe.len(),
        chunk_delay,
        slot_delay
    );

    if chunk_delay.is_zero() && slot_delay.is_zero() {
        stager.send_bytes(&probe.to_bytes())?;
    } else {
        if slot_delay.is_zero() {
            stager.send_bytes(&probe.slots.concat())?;
        } else {
            for slot in &probe.slots {
                stager.send_bytes(slot)?;
                stager.pause(slot_delay);
            }
        }
        stager.pause(chunk_delay);

        stager.send_bytes(&probe.clear_home)?;
        stager.wait_after_clear();

        stager.send_bytes(&probe.row0)?;
        stager.pause(chunk_delay);

        stager.send_bytes(&probe.row1)?;
    }

    stager.pause(options.hold);
    info!("done; expect 8 distinct glyphs for slots 0..7 on rows 0 and 1");
    Ok(())
}
