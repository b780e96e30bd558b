//! Scripted stand-in for the scanner hardware.

use crate::error::ScannerError;
use crate::transport::{Connector, Link};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use crossbeam_utils::atomic::AtomicCell;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Shared {
    unavailable: AtomicCell<bool>,
    fail_writes: AtomicCell<bool>,
    connects: AtomicCell<usize>,
    written: Mutex<Vec<u8>>,
    input: Mutex<Option<Sender<Vec<u8>>>>,
}

/// Test handle on a fake device. Bytes fed here come out of the current
/// link's reader; bytes written to the link are recorded.
#[derive(Clone, Default)]
pub(crate) struct MockDevice {
    shared: Arc<Shared>,
}

impl MockDevice {
    pub(crate) fn new() -> MockDevice {
        MockDevice::default()
    }

    pub(crate) fn connector(&self) -> MockConnector {
        MockConnector {
            shared: self.shared.clone(),
        }
    }

    pub(crate) fn feed(&self, bytes: &[u8]) {
        if let Some(tx) = self.shared.input.lock().unwrap().as_ref() {
            tx.send(bytes.to_vec()).unwrap();
        }
    }

    /// Breaks the current link. Its reader fails once pending bytes are read.
    pub(crate) fn drop_link(&self) {
        self.shared.input.lock().unwrap().take();
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.shared.unavailable.store(!available);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail);
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.shared.connects.load()
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.shared.written.lock().unwrap().clone()
    }

    pub(crate) fn written_lines(&self) -> Vec<String> {
        String::from_utf8(self.written())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

pub(crate) struct MockConnector {
    shared: Arc<Shared>,
}

impl Connector for MockConnector {
    fn connect(&mut self) -> Result<Link, ScannerError> {
        self.shared.connects.fetch_add(1);
        if self.shared.unavailable.load() {
            return Err(io::Error::new(ErrorKind::NotFound, "mock device unplugged").into());
        }
        let (tx, rx) = unbounded();
        *self.shared.input.lock().unwrap() = Some(tx);
        Ok(Link {
            reader: Box::new(MockReader {
                rx,
                pending: Vec::new(),
            }),
            writer: Box::new(MockWriter {
                shared: self.shared.clone(),
            }),
        })
    }

    fn describe(&self) -> String {
        "mock device".to_string()
    }
}

struct MockReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl Read for MockReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(Duration::from_millis(5)) {
                Ok(bytes) => self.pending = bytes,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(ErrorKind::TimedOut, "no data"))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(ErrorKind::BrokenPipe, "link dropped"))
                }
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct MockWriter {
    shared: Arc<Shared>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.shared.fail_writes.load() {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "write failed"));
        }
        self.shared.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
