//! Transmission sequencing around firmware stalls
//!
//! The HD44780 clear instruction keeps the firmware busy for milliseconds,
//! long enough for a shallow UART receive buffer to overflow. Everything that
//! writes to the panel goes through a `Stager`, which owns the delays:
//!
//! ```text
//! open ─► settle ─► [mode] backlight clear home ─► after-clear ─► DDRAM writes
//!                   └──────── one write ────────┘
//! CGRAM: slot 0 ─► slot delay ─► slot 1 ─► ... ─► slot 7 ─► slot delay
//! ```

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, info, trace};
use lospanel_display::glyphs::glyph_payload;
use lospanel_display::GlyphBitmap;
use lospanel_hal::UartTx;
use lospanel_protocol::command::encode_all;
use lospanel_protocol::{Command, MetaOption, StreamingMode};

/// Delays applied around transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPolicy {
    /// Wait after opening the port (covers the auto-reset pulse)
    pub settle: Duration,
    /// Wait after clear/home before any DDRAM write
    pub after_clear: Duration,
    /// Wait after each CGRAM slot upload
    pub slot_delay: Duration,
    /// Wait between probe phases
    pub chunk_delay: Duration,
    /// Wait after a streaming-mode change before the payload
    pub mode_settle: Duration,
}

impl Default for StagingPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(3000),
            after_clear: Duration::from_millis(10),
            slot_delay: Duration::from_millis(15),
            chunk_delay: Duration::ZERO,
            mode_settle: Duration::from_millis(50),
        }
    }
}

/// Wall-clock delay for real hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        thread::sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Block for `duration` on `delay`; zero is a no-op
pub fn pause<D: DelayNs>(delay: &mut D, duration: Duration) {
    let mut remaining = duration.as_micros();
    while remaining > 0 {
        let step = remaining.min(u32::MAX as u128);
        delay.delay_us(step as u32);
        remaining -= step;
    }
}

/// Sends commands over a link, inserting the policy's delays
pub struct Stager<'a, T, D> {
    link: &'a mut T,
    delay: &'a mut D,
    policy: &'a StagingPolicy,
}

impl<'a, T: UartTx, D: DelayNs> Stager<'a, T, D> {
    pub fn new(link: &'a mut T, delay: &'a mut D, policy: &'a StagingPolicy) -> Self {
        Self {
            link,
            delay,
            policy,
        }
    }

    /// Wait for the board to come out of reset
    pub fn settle(&mut self) {
        info!("waiting {:.1}s for board reset", self.policy.settle.as_secs_f32());
        pause(self.delay, self.policy.settle);
    }

    pub fn pause(&mut self, duration: Duration) {
        pause(self.delay, duration);
    }

    /// Write raw bytes and flush
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), T::Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        trace!("tx {} bytes", bytes.len());
        self.link.send(bytes)
    }

    /// Encode commands back to back as one write
    ///
    /// Returns the number of bytes sent.
    pub fn send(&mut self, commands: &[Command<'_>]) -> Result<usize, T::Error> {
        let bytes = encode_all(commands);
        self.send_bytes(&bytes)?;
        Ok(bytes.len())
    }

    /// Select a streaming mode and give the firmware time to switch
    pub fn set_streaming_mode(&mut self, mode: StreamingMode) -> Result<(), T::Error> {
        debug!("streaming mode {:?}", mode);
        self.send(&[Command::SetMeta(MetaOption::StreamingMode(mode))])?;
        pause(self.delay, self.policy.mode_settle);
        Ok(())
    }

    /// Optional mode, optional backlight, clear and home in one write,
    /// then the after-clear wait
    pub fn prepare_screen(
        &mut self,
        streaming: Option<StreamingMode>,
        backlight: Option<u8>,
    ) -> Result<(), T::Error> {
        let mut commands = Vec::with_capacity(4);
        if let Some(mode) = streaming {
            commands.push(Command::SetMeta(MetaOption::StreamingMode(mode)));
        }
        if let Some(level) = backlight {
            commands.push(Command::SetBacklight(level));
        }
        commands.push(Command::Clear);
        commands.push(Command::Home);
        self.send(&commands)?;
        self.wait_after_clear();
        Ok(())
    }

    /// Give the controller time to finish a clear
    pub fn wait_after_clear(&mut self) {
        pause(self.delay, self.policy.after_clear);
    }

    /// Program CGRAM slot by slot, starting at slot 0
    ///
    /// Each slot is one write: the slot's CGRAM address then eight rows.
    pub fn upload_glyphs(&mut self, glyphs: &[GlyphBitmap]) -> Result<(), T::Error> {
        for (slot, glyph) in glyphs.iter().enumerate().take(8) {
            let rows = glyph_payload(glyph);
            self.send(&[Command::select_glyph_slot(slot as u8), Command::Data(&rows)])?;
            pause(self.delay, self.policy.slot_delay);
        }
        debug!("uploaded {} glyphs", glyphs.len().min(8));
        Ok(())
    }
}
