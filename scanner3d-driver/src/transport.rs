//! Line-oriented duplex link to the scanner that re-opens itself after faults.

use crate::constants::{LINE_DELIMITER, READ_BUFFER_SIZE};
use crate::error::ScannerError;
use crate::framing::LineFramer;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use crossbeam_utils::atomic::AtomicCell;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Freshly opened read and write halves of one connection.
pub struct Link {
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
}

/// Opens a new [`Link`] each time the transport (re)connects.
pub trait Connector: Send + 'static {
    fn connect(&mut self) -> Result<Link, ScannerError>;

    /// Human readable name of the peer, used in log lines.
    fn describe(&self) -> String;
}

/// Destination of outgoing command lines.
pub trait CommandSink {
    fn send(&self, command: &str) -> Result<(), ScannerError>;
}

/// Write half of the current link, shared between the transport thread and
/// command senders.
///
/// A failed write drops the handle and marks the link down; the transport
/// thread then re-opens the connection.
#[derive(Clone)]
pub struct LinkWriter {
    writer: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
    link_up: Arc<AtomicCell<bool>>,
}

impl LinkWriter {
    pub fn new() -> LinkWriter {
        LinkWriter {
            writer: Arc::new(Mutex::new(None)),
            link_up: Arc::new(AtomicCell::new(false)),
        }
    }

    pub fn is_up(&self) -> bool {
        self.link_up.load()
    }

    pub(crate) fn install(&self, writer: Box<dyn Write + Send>) {
        *self.lock() = Some(writer);
        self.link_up.store(true);
    }

    pub(crate) fn remove(&self) {
        *self.lock() = None;
        self.link_up.store(false);
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Write + Send>>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LinkWriter {
    fn default() -> Self {
        LinkWriter::new()
    }
}

impl CommandSink for LinkWriter {
    /// Writes `command` followed by the line delimiter. Nothing is queued
    /// while the link is down.
    fn send(&self, command: &str) -> Result<(), ScannerError> {
        let mut guard = self.lock();
        let writer = guard.as_mut().ok_or(ScannerError::NotConnected)?;

        let mut frame = Vec::with_capacity(command.len() + 1);
        frame.extend_from_slice(command.as_bytes());
        frame.push(LINE_DELIMITER);

        let result = writer.write_all(&frame).and_then(|_| writer.flush());
        if let Err(e) = result {
            tracing::warn!("Write of {:?} failed, dropping link: {}", command, e);
            *guard = None;
            self.link_up.store(false);
            return Err(e.into());
        }
        tracing::debug!("-> {}", command);
        Ok(())
    }
}

/// Notifications from the transport thread, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Line(String),
    Disconnected,
}

enum LinkEnd {
    Lost,
    Terminated,
}

/// Connects, forwards received lines and reconnects after `backoff` until
/// `terminator_rx` fires or is dropped.
pub(crate) fn run_transport(
    mut connector: Box<dyn Connector>,
    backoff: Duration,
    writer: LinkWriter,
    event_tx: Sender<TransportEvent>,
    terminator_rx: Receiver<bool>,
) {
    let mut framer = LineFramer::new();
    loop {
        if do_terminate(&terminator_rx) {
            return;
        }

        match connector.connect() {
            Ok(Link {
                mut reader,
                writer: link_writer,
            }) => {
                tracing::info!("Connected to {}", connector.describe());
                writer.install(link_writer);
                if event_tx.send(TransportEvent::Connected).is_err() {
                    writer.remove();
                    return;
                }

                let end = pump_lines(&mut reader, &mut framer, &writer, &event_tx, &terminator_rx);

                writer.remove();
                framer.clear();
                // the receiver may already be gone during shutdown
                let _ = event_tx.send(TransportEvent::Disconnected);
                if let LinkEnd::Terminated = end {
                    return;
                }
                tracing::warn!(
                    "Lost link to {}, retrying in {:?}",
                    connector.describe(),
                    backoff
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to {}: {}, retrying in {:?}",
                    connector.describe(),
                    e,
                    backoff
                );
            }
        }

        match terminator_rx.recv_timeout(backoff) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => return,
        }
    }
}

fn pump_lines(
    reader: &mut Box<dyn Read + Send>,
    framer: &mut LineFramer,
    writer: &LinkWriter,
    event_tx: &Sender<TransportEvent>,
    terminator_rx: &Receiver<bool>,
) -> LinkEnd {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        if do_terminate(terminator_rx) {
            return LinkEnd::Terminated;
        }
        if !writer.is_up() {
            return LinkEnd::Lost;
        }

        match reader.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("Link closed by peer");
                return LinkEnd::Lost;
            }
            Ok(n) => {
                for line in framer.push(&buf[..n]) {
                    if event_tx.send(TransportEvent::Line(line)).is_err() {
                        return LinkEnd::Terminated;
                    }
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(e) => {
                tracing::debug!("Read failed: {}", e);
                return LinkEnd::Lost;
            }
        }
    }
}

pub(crate) fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    match terminator_rx.try_recv() {
        Ok(terminate) => terminate,
        Err(TryRecvError::Empty) => false,
        Err(TryRecvError::Disconnected) => true,
    }
}
