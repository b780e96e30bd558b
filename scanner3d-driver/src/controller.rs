//! Operator commands, gated on the current Device State.

use crate::config::CommandSet;
use crate::error::CommandRejected;
use crate::events::{ScannerEvent, Subscription, SubscriptionId};
use crate::state::{ScannerState, SharedState};
use crate::transport::CommandSink;
use scanner3d_data::{DeviceState, ScanSample, ScanVolume};

/// Checks preconditions, applies the optimistic state change and forwards
/// the command line to the device.
///
/// A rejected command sends nothing and leaves the state untouched. A
/// command that fails to send keeps its state change; the transport
/// reconnects on its own and callers are not expected to retry.
pub struct Controller<S: CommandSink> {
    sink: S,
    state: SharedState,
    commands: CommandSet,
}

impl<S: CommandSink> Controller<S> {
    pub fn new(sink: S, state: SharedState, commands: CommandSet) -> Controller<S> {
        Controller {
            sink,
            state,
            commands,
        }
    }

    pub fn start_scan(&self, volume: ScanVolume) -> Result<(), CommandRejected> {
        let layers = volume.estimated_layers();
        self.execute("start", &self.commands.scan, |s| {
            require_connected(s)?;
            if s.device.scanning {
                return Err(CommandRejected::AlreadyScanning);
            }
            s.device.scanning = true;
            s.volume = volume;
            Ok(())
        })?;
        tracing::info!(
            "Scanning {}x{}x{} volume, about {} layers",
            volume.width,
            volume.height,
            volume.depth,
            layers
        );
        Ok(())
    }

    pub fn pause(&self) -> Result<(), CommandRejected> {
        self.execute("pause", &self.commands.pause, |s| {
            require_connected(s)?;
            s.device.scanning = false;
            Ok(())
        })
    }

    pub fn resume(&self) -> Result<(), CommandRejected> {
        self.execute("resume", &self.commands.resume, |s| {
            require_connected(s)?;
            s.device.scanning = true;
            Ok(())
        })
    }

    /// Clears both the scanning and emergency stop flags. Buffered points
    /// are kept.
    pub fn reset(&self) -> Result<(), CommandRejected> {
        self.execute("reset", &self.commands.reset, |s| {
            require_connected(s)?;
            s.device.reset();
            Ok(())
        })
    }

    pub fn calibrate(&self) -> Result<(), CommandRejected> {
        self.execute("calibrate", &self.commands.calibrate, require_idle)
    }

    pub fn move_sensor(&self, position: f64) -> Result<(), CommandRejected> {
        let command = format!("{} {}", self.commands.move_sensor, position);
        self.execute("move sensor", &command, |s| {
            require_idle(s)?;
            require_finite(position)
        })
    }

    pub fn rotate_plate(&self, angle: f64) -> Result<(), CommandRejected> {
        let command = format!("{} {}", self.commands.rotate_plate, angle);
        self.execute("rotate plate", &command, |s| {
            require_idle(s)?;
            require_finite(angle)
        })
    }

    /// Sends `stop` whenever the link is up, whatever else the state says.
    pub fn emergency_stop(&self) -> Result<(), CommandRejected> {
        self.execute("emergency stop", &self.commands.stop, |s| {
            require_connected(s)?;
            s.device.scanning = false;
            s.device.emergency_stop = true;
            Ok(())
        })
    }

    /// Asks the firmware to report its position.
    pub fn request_status(&self) -> Result<(), CommandRejected> {
        self.execute("status", &self.commands.status, require_connected)
    }

    /// Sends `command` verbatim, terminal style.
    pub fn send_raw(&self, command: &str) -> Result<(), CommandRejected> {
        self.execute("raw", command, require_connected)
    }

    pub fn device_status(&self) -> DeviceState {
        self.state.device()
    }

    /// Takes every sample collected since the previous call.
    pub fn scanned_points(&self) -> Vec<ScanSample> {
        self.state.drain_points()
    }

    /// Volume of the most recent scan start.
    pub fn scan_volume(&self) -> ScanVolume {
        self.state.update(|s| s.volume)
    }

    pub fn subscribe(&self) -> Subscription {
        self.state.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    fn execute(
        &self,
        intent: &str,
        command: &str,
        apply: impl FnOnce(&mut ScannerState) -> Result<(), CommandRejected>,
    ) -> Result<(), CommandRejected> {
        let changed = self.state.update(|s| {
            let before = s.device.clone();
            apply(s).map(|()| (s.device != before).then(|| s.device.clone()))
        });

        let changed = match changed {
            Ok(changed) => changed,
            Err(reason) => {
                tracing::warn!("Rejected {}: {}", intent, reason);
                return Err(reason);
            }
        };
        if let Some(device) = changed {
            self.state.publish(ScannerEvent::DeviceState(device));
        }

        tracing::info!("Sending {} command {:?}", intent, command);
        self.sink.send(command).map_err(|e| {
            tracing::warn!("Failed to send {:?}: {}", command, e);
            CommandRejected::SendFailed(e.to_string())
        })
    }
}

fn require_connected(state: &mut ScannerState) -> Result<(), CommandRejected> {
    if !state.device.connected {
        return Err(CommandRejected::NotConnected);
    }
    Ok(())
}

fn require_finite(value: f64) -> Result<(), CommandRejected> {
    if !value.is_finite() {
        return Err(CommandRejected::InvalidArgument(value.to_string()));
    }
    Ok(())
}

fn require_idle(state: &mut ScannerState) -> Result<(), CommandRejected> {
    require_connected(state)?;
    if state.device.scanning {
        return Err(CommandRejected::ScanInProgress);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScannerError;
    use crate::events::EventBus;
    use proptest::prelude::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        down: bool,
    }

    impl CommandSink for RecordingSink {
        fn send(&self, command: &str) -> Result<(), ScannerError> {
            if self.down {
                return Err(ScannerError::NotConnected);
            }
            self.sent.lock().unwrap().push(command.to_string());
            Ok(())
        }
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    fn controller(connected: bool) -> Controller<RecordingSink> {
        controller_with(RecordingSink::default(), CommandSet::default(), connected)
    }

    fn controller_with(
        sink: RecordingSink,
        commands: CommandSet,
        connected: bool,
    ) -> Controller<RecordingSink> {
        let state = SharedState::new(EventBus::new(16));
        state.update(|s| s.device.connected = connected);
        Controller::new(sink, state, commands)
    }

    #[test]
    fn test_everything_blocked_while_disconnected() {
        let controller = controller(false);
        let expected = Err(CommandRejected::NotConnected);
        assert_eq!(controller.start_scan(ScanVolume::default()), expected);
        assert_eq!(controller.pause(), expected);
        assert_eq!(controller.resume(), expected);
        assert_eq!(controller.reset(), expected);
        assert_eq!(controller.calibrate(), expected);
        assert_eq!(controller.move_sensor(10.), expected);
        assert_eq!(controller.rotate_plate(10.), expected);
        assert_eq!(controller.emergency_stop(), expected);
        assert_eq!(controller.request_status(), expected);
        assert_eq!(controller.send_raw("scan"), expected);

        assert!(controller.sink.sent().is_empty());
        assert_eq!(controller.device_status(), DeviceState::default());
    }

    #[test]
    fn test_start_scan() {
        let controller = controller(true);
        let volume = ScanVolume::new(10., 10., 25.);
        assert_eq!(controller.start_scan(volume), Ok(()));
        assert!(controller.device_status().scanning);
        assert_eq!(controller.scan_volume(), volume);
        assert_eq!(controller.sink.sent(), vec!["scan"]);
    }

    #[test]
    fn test_start_while_scanning_is_rejected() {
        let controller = controller(true);
        controller.start_scan(ScanVolume::default()).unwrap();
        let before = controller.device_status();

        assert_eq!(
            controller.start_scan(ScanVolume::new(1., 1., 1.)),
            Err(CommandRejected::AlreadyScanning)
        );
        assert_eq!(controller.device_status(), before);
        assert_eq!(controller.scan_volume(), ScanVolume::default());
        assert_eq!(controller.sink.sent(), vec!["scan"]);
    }

    #[test]
    fn test_pause_resume_reset() {
        let controller = controller(true);
        controller.start_scan(ScanVolume::default()).unwrap();
        controller.pause().unwrap();
        assert!(!controller.device_status().scanning);
        controller.resume().unwrap();
        assert!(controller.device_status().scanning);
        controller.emergency_stop().unwrap();
        controller.reset().unwrap();

        let device = controller.device_status();
        assert!(!device.scanning);
        assert!(!device.emergency_stop);
        assert!(device.connected);
        assert_eq!(
            controller.sink.sent(),
            vec!["scan", "pause", "resume", "stop", "reset"]
        );
    }

    #[test]
    fn test_manual_moves_blocked_while_scanning() {
        let controller = controller(true);
        controller.start_scan(ScanVolume::default()).unwrap();
        let before = controller.device_status();

        assert_eq!(
            controller.move_sensor(40.),
            Err(CommandRejected::ScanInProgress)
        );
        assert_eq!(
            controller.rotate_plate(90.),
            Err(CommandRejected::ScanInProgress)
        );
        assert_eq!(
            controller.calibrate(),
            Err(CommandRejected::ScanInProgress)
        );
        assert_eq!(controller.device_status(), before);
        assert_eq!(controller.sink.sent(), vec!["scan"]);
    }

    #[test]
    fn test_positional_commands() {
        let controller = controller(true);
        controller.move_sensor(40.).unwrap();
        controller.rotate_plate(12.5).unwrap();
        controller.calibrate().unwrap();
        controller.request_status().unwrap();
        controller.send_raw("m_base -90").unwrap();
        assert_eq!(
            controller.sink.sent(),
            vec!["m_sensor 40", "m_base 12.5", "calibrate", "status", "m_base -90"]
        );
        assert_eq!(controller.device_status().sensor_height, 0.);
    }

    #[test]
    fn test_non_finite_positions_are_rejected() {
        let controller = controller(true);
        assert_eq!(
            controller.move_sensor(f64::NAN),
            Err(CommandRejected::InvalidArgument("NaN".to_string()))
        );
        assert_eq!(
            controller.rotate_plate(f64::INFINITY),
            Err(CommandRejected::InvalidArgument("inf".to_string()))
        );
        assert!(matches!(
            controller.rotate_plate(f64::NEG_INFINITY),
            Err(CommandRejected::InvalidArgument(_))
        ));
        assert!(controller.sink.sent().is_empty());
    }

    #[test]
    fn test_emergency_stop_ignores_scanning_state() {
        let controller = controller(true);
        controller.emergency_stop().unwrap();
        controller.start_scan(ScanVolume::default()).unwrap();
        controller.emergency_stop().unwrap();

        let device = controller.device_status();
        assert!(!device.scanning);
        assert!(device.emergency_stop);
        assert_eq!(controller.sink.sent(), vec!["stop", "scan", "stop"]);
    }

    #[test]
    fn test_send_failure_keeps_optimistic_state() {
        let sink = RecordingSink {
            down: true,
            ..Default::default()
        };
        let controller = controller_with(sink, CommandSet::default(), true);
        assert!(matches!(
            controller.start_scan(ScanVolume::default()),
            Err(CommandRejected::SendFailed(_))
        ));
        assert!(controller.device_status().scanning);
    }

    #[test]
    fn test_custom_verbs() {
        let commands = CommandSet {
            pause: "hold".to_string(),
            move_sensor: "ms".to_string(),
            ..Default::default()
        };
        let controller = controller_with(RecordingSink::default(), commands, true);
        controller.pause().unwrap();
        controller.move_sensor(3.).unwrap();
        assert_eq!(controller.sink.sent(), vec!["hold", "ms 3"]);
    }

    #[test]
    fn test_state_changes_are_published() {
        let controller = controller(true);
        let subscription = controller.subscribe();
        controller.start_scan(ScanVolume::default()).unwrap();
        // no state change, no event
        controller.move_sensor(1.).unwrap_err();
        controller.request_status().unwrap();

        let events: Vec<ScannerEvent> = subscription.receiver.try_iter().collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ScannerEvent::DeviceState(device) => assert!(device.scanning),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(controller.unsubscribe(subscription.id));
    }

    #[derive(Clone, Copy, Debug)]
    enum Intent {
        Start,
        Pause,
        Resume,
        Reset,
        Calibrate,
        MoveSensor,
        RotatePlate,
        EmergencyStop,
        Link(bool),
    }

    fn intent() -> impl Strategy<Value = Intent> {
        prop_oneof![
            Just(Intent::Start),
            Just(Intent::Pause),
            Just(Intent::Resume),
            Just(Intent::Reset),
            Just(Intent::Calibrate),
            Just(Intent::MoveSensor),
            Just(Intent::RotatePlate),
            Just(Intent::EmergencyStop),
            any::<bool>().prop_map(Intent::Link),
        ]
    }

    proptest! {
        #[test]
        fn test_rejections_send_nothing(intents in prop::collection::vec(intent(), 1..40)) {
            let controller = controller(false);
            for intent in intents {
                let before = controller.device_status();
                let n_sent = controller.sink.sent().len();
                let result = match intent {
                    Intent::Start => controller.start_scan(ScanVolume::default()),
                    Intent::Pause => controller.pause(),
                    Intent::Resume => controller.resume(),
                    Intent::Reset => controller.reset(),
                    Intent::Calibrate => controller.calibrate(),
                    Intent::MoveSensor => controller.move_sensor(5.),
                    Intent::RotatePlate => controller.rotate_plate(5.),
                    Intent::EmergencyStop => controller.emergency_stop(),
                    Intent::Link(up) => {
                        controller.state.update(|s| s.device.connected = up);
                        continue;
                    }
                };
                match result {
                    Ok(()) => prop_assert_eq!(controller.sink.sent().len(), n_sent + 1),
                    Err(reason) => {
                        prop_assert_eq!(controller.sink.sent().len(), n_sent);
                        prop_assert_eq!(controller.device_status(), before.clone());
                        if !before.connected {
                            prop_assert_eq!(reason, CommandRejected::NotConnected);
                        }
                    }
                }
            }
        }
    }
}
