//! Host-side driver for a rotary 3D scanner rig on a serial line.
//!
//! [`run_scanner`] starts two threads: a transport that keeps the serial
//! link open and frames incoming lines, and an interpreter that applies
//! them to the shared Device State and point buffer. Operator commands go
//! through the [`Controller`].

mod buffer;
pub mod config;
mod constants;
mod controller;
mod driver_threads;
mod error;
mod events;
mod framing;
mod interpreter;
mod mapping;
pub mod protocol;
mod serial;
mod state;
#[cfg(test)]
mod testing;
mod transport;

pub use crate::buffer::ScanPointBuffer;
pub use crate::config::{CommandSet, EventConfig, RigConfig, ScannerConfig, SerialConfig};
pub use crate::controller::Controller;
use crate::driver_threads::run_interpreter;
pub use crate::driver_threads::{join, DriverThreads};
pub use crate::error::{CommandRejected, ScannerError};
pub use crate::events::{EventBus, ScannerEvent, Subscription, SubscriptionId};
pub use crate::interpreter::Interpreter;
pub use crate::mapping::{RigMapping, TurntableRig};
pub use crate::serial::SerialConnector;
pub use crate::state::{ScannerState, SharedState};
use crate::transport::run_transport;
pub use crate::transport::{CommandSink, Connector, Link, LinkWriter, TransportEvent};

use crate::constants::TRANSPORT_QUEUE_SIZE;
use crossbeam_channel::bounded;

/// A running scanner session. Dropping it stops and joins both threads.
pub struct Scanner {
    controller: Controller<LinkWriter>,
    writer: LinkWriter,
    _threads: DriverThreads,
}

/// Function to launch the scanner driver on the configured serial port.
///
/// The port does not need to exist yet: the transport keeps retrying every
/// `serial.reconnect_backoff_ms` until the device shows up.
pub fn run_scanner(config: &ScannerConfig) -> Result<Scanner, ScannerError> {
    Scanner::with_connector(
        config,
        SerialConnector::from_config(&config.serial),
        TurntableRig::new(config.rig.clone()),
    )
}

impl Scanner {
    /// Starts a session over any [`Connector`] and [`RigMapping`].
    pub fn with_connector(
        config: &ScannerConfig,
        connector: impl Connector,
        mapping: impl RigMapping + 'static,
    ) -> Result<Scanner, ScannerError> {
        config.validate()?;
        tracing::info!("Starting scanner driver on {}", connector.describe());

        let state = SharedState::new(EventBus::new(config.events.capacity));
        let writer = LinkWriter::new();
        let interpreter = Interpreter::new(state.clone(), Box::new(mapping));

        let (transport_terminator_tx, transport_terminator_rx) = bounded(10);
        let (interpreter_terminator_tx, interpreter_terminator_rx) = bounded(10);
        let (event_tx, event_rx) = bounded::<TransportEvent>(TRANSPORT_QUEUE_SIZE);

        let backoff = config.serial.reconnect_backoff();
        let transport_writer = writer.clone();
        let connector: Box<dyn Connector> = Box::new(connector);
        let transport_thread = Some(std::thread::spawn(move || {
            run_transport(
                connector,
                backoff,
                transport_writer,
                event_tx,
                transport_terminator_rx,
            );
        }));

        let interpreter_thread = Some(std::thread::spawn(move || {
            run_interpreter(interpreter, event_rx, interpreter_terminator_rx);
        }));

        let threads = DriverThreads {
            transport_terminator_tx,
            interpreter_terminator_tx,
            transport_thread,
            interpreter_thread,
        };

        Ok(Scanner {
            controller: Controller::new(writer.clone(), state, config.commands.clone()),
            writer,
            _threads: threads,
        })
    }

    pub fn controller(&self) -> &Controller<LinkWriter> {
        &self.controller
    }

    /// Whether the transport currently holds an open link. Device State's
    /// `connected` flag follows shortly after.
    pub fn is_link_up(&self) -> bool {
        self.writer.is_up()
    }
}
