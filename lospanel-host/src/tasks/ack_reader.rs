//! Firmware log reader
//!
//! Reads the firmware's debug output while the main thread transmits. Lines
//! go out over an mpsc channel; the main thread drains it only after the
//! reader has been told to stop, so no lock guards the captured log.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{info, trace, warn};
use lospanel_hal::UartRx;

/// Buffer size for one read
const RX_BUF_SIZE: usize = 256;

/// Poll interval while waiting for the reader to exit
const JOIN_POLL: Duration = Duration::from_millis(5);

/// Splits a byte stream into text lines
///
/// Bytes are decoded lossily; trailing whitespace (including `\r`) is
/// dropped and blank lines are skipped.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                let raw = std::mem::take(&mut self.pending);
                if let Some(line) = Self::finish_line(&raw) {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Whatever is left without a terminating newline
    pub fn flush(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.pending);
        Self::finish_line(&raw)
    }

    fn finish_line(raw: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}

/// Handle to a running reader thread
pub struct AckReader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    lines: Receiver<String>,
}

/// Start reading `rx` on a new thread
///
/// When a read returns nothing the thread sleeps `idle` before polling again.
pub fn spawn_ack_reader<R>(rx: R, idle: Duration) -> std::io::Result<AckReader>
where
    R: UartRx + Send + 'static,
    R::Error: Debug,
{
    let stop = Arc::new(AtomicBool::new(false));
    let (tx, lines) = mpsc::channel();

    let handle = thread::Builder::new().name("ack-reader".into()).spawn({
        let stop = Arc::clone(&stop);
        move || reader_loop(rx, idle, &stop, tx)
    })?;

    Ok(AckReader { stop, handle, lines })
}

fn reader_loop<R>(mut rx: R, idle: Duration, stop: &AtomicBool, tx: Sender<String>)
where
    R: UartRx,
    R::Error: Debug,
{
    let mut assembler = LineAssembler::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    while !stop.load(Ordering::Acquire) {
        match rx.read_available(&mut buf) {
            Ok(0) => thread::sleep(idle),
            Ok(n) => {
                trace!("rx {} bytes", n);
                for line in assembler.push(&buf[..n]) {
                    info!("fw: {}", line);
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("serial read error, log capture stopped: {:?}", e);
                break;
            }
        }
    }

    if let Some(line) = assembler.flush() {
        info!("fw: {}", line);
        let _ = tx.send(line);
    }
}

impl AckReader {
    /// Signal the thread to stop, wait up to `timeout` for it, and return
    /// every line it captured
    ///
    /// A thread still running after `timeout` is left detached; the lines it
    /// sent so far are still returned.
    pub fn stop_and_join(self, timeout: Duration) -> Vec<String> {
        self.stop.store(true, Ordering::Release);

        let deadline = Instant::now() + timeout;
        while !self.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(JOIN_POLL);
        }

        if self.handle.is_finished() {
            if self.handle.join().is_err() {
                warn!("log reader panicked");
            }
        } else {
            warn!("log reader did not stop within {:?}", timeout);
        }

        self.lines.try_iter().collect()
    }
}
