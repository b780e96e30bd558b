use crate::interpreter::Interpreter;
use crate::transport::TransportEvent;
use crossbeam_channel::{select, Receiver, Sender};
use std::thread::JoinHandle;

/// Struct that contains the transport and interpreter threads.
pub struct DriverThreads {
    pub(crate) transport_terminator_tx: Sender<bool>,
    pub(crate) interpreter_terminator_tx: Sender<bool>,
    pub(crate) transport_thread: Option<JoinHandle<()>>,
    pub(crate) interpreter_thread: Option<JoinHandle<()>>,
}

/// Applies transport events in arrival order until terminated or the
/// transport thread is gone.
pub(crate) fn run_interpreter(
    interpreter: Interpreter,
    event_rx: Receiver<TransportEvent>,
    terminator_rx: Receiver<bool>,
) {
    loop {
        select! {
            recv(event_rx) -> event => match event {
                Ok(TransportEvent::Line(line)) => {
                    interpreter.process_line(&line);
                }
                Ok(TransportEvent::Connected) => interpreter.link_changed(true),
                Ok(TransportEvent::Disconnected) => interpreter.link_changed(false),
                Err(_) => return,
            },
            recv(terminator_rx) -> _ => return,
        }
    }
}

/// Function to join driver threads.
/// This function is automatically called when `driver_threads` is dropped.
pub fn join(driver_threads: &mut DriverThreads) {
    // a send only fails when the thread already exited
    let _ = driver_threads.transport_terminator_tx.send(true);
    let _ = driver_threads.interpreter_terminator_tx.send(true);

    if let Some(thread) = driver_threads.transport_thread.take() {
        if thread.join().is_err() {
            tracing::error!("Transport thread panicked");
        }
    }
    if let Some(thread) = driver_threads.interpreter_thread.take() {
        if thread.join().is_err() {
            tracing::error!("Interpreter thread panicked");
        }
    }
}

impl Drop for DriverThreads {
    fn drop(&mut self) {
        join(self);
    }
}
