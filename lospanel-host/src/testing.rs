//! In-memory link and delay doubles for host tests

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use lospanel_hal::{UartRx, UartTx};

use crate::serial::LinkError;

/// Something observable that happened on the link or the delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    Flush,
    Delay(Duration),
}

/// Ordered record shared by a `MockLink` and a `RecordingDelay`
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Every written byte, concatenated
    pub fn written(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Separate write calls, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Delay(d) => Some(d),
                _ => None,
            })
            .collect()
    }
}

/// Link that records writes and replays scripted incoming chunks
#[derive(Debug, Clone)]
pub struct MockLink {
    journal: Journal,
    incoming: Arc<Mutex<VecDeque<Vec<u8>>>>,
    fail_writes: bool,
}

impl MockLink {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            incoming: Arc::default(),
            fail_writes: false,
        }
    }

    /// Queue bytes to be returned by later reads
    pub fn push_incoming(&self, chunk: &[u8]) {
        self.incoming.lock().unwrap().push_back(chunk.to_vec());
    }

    /// Every write fails with a broken pipe
    pub fn failing(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl UartTx for MockLink {
    type Error = LinkError;

    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        if self.fail_writes {
            return Err(LinkError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock link unplugged",
            )));
        }
        self.journal.record(Event::Write(data.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        self.journal.record(Event::Flush);
        Ok(())
    }
}

impl UartRx for MockLink {
    type Error = LinkError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut incoming = self.incoming.lock().unwrap();
        let Some(mut chunk) = incoming.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            incoming.push_front(chunk);
        }
        Ok(n)
    }
}

/// Delay that returns immediately and journals the requested duration
#[derive(Debug, Clone)]
pub struct RecordingDelay {
    journal: Journal,
}

impl RecordingDelay {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.journal.record(Event::Delay(Duration::from_nanos(ns as u64)));
    }

    fn delay_us(&mut self, us: u32) {
        self.journal.record(Event::Delay(Duration::from_micros(us as u64)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.journal.record(Event::Delay(Duration::from_millis(ms as u64)));
    }
}
