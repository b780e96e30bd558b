use crate::events::ScannerEvent;
use crate::mapping::RigMapping;
use crate::protocol::{parse_line, Message};
use crate::state::SharedState;

/// Applies device messages to the shared state, one line at a time.
///
/// All effects of a line are applied under a single lock; notifications
/// are published after the lock is released.
pub struct Interpreter {
    state: SharedState,
    mapping: Box<dyn RigMapping>,
}

impl Interpreter {
    pub fn new(state: SharedState, mapping: Box<dyn RigMapping>) -> Interpreter {
        Interpreter { state, mapping }
    }

    /// Classifies `line`, applies its effects and returns the classification.
    pub fn process_line(&self, line: &str) -> Message {
        tracing::trace!("<- {}", line);
        let message = parse_line(line);
        let event = self.apply(&message);
        if let Some(event) = event {
            self.state.publish(event);
        }
        message
    }

    /// Records that the serial link went up or down.
    pub fn link_changed(&self, connected: bool) {
        let device = self.state.update(|s| {
            s.device.connected = connected;
            s.device.clone()
        });
        self.state.publish(ScannerEvent::Link { connected });
        self.state.publish(ScannerEvent::DeviceState(device));
    }

    fn apply(&self, message: &Message) -> Option<ScannerEvent> {
        match message {
            Message::Position(position) => {
                let base = self.mapping.base_degrees(position.base);
                let device = self.state.update(|s| {
                    s.device
                        .update_position(base, position.height as f64, position.distance);
                    s.device.clone()
                });
                Some(ScannerEvent::DeviceState(device))
            }
            Message::PositionSample(position) => {
                let base = self.mapping.base_degrees(position.base);
                let sample = self.mapping.sample(position);
                let device = self.state.update(|s| {
                    s.device
                        .update_position(base, position.height as f64, position.distance);
                    if let Some(sample) = sample {
                        s.points.push(sample);
                    }
                    s.device.clone()
                });
                Some(ScannerEvent::DeviceState(device))
            }
            Message::Ok => {
                tracing::debug!("Command acknowledged");
                Some(ScannerEvent::Acknowledged)
            }
            Message::Error(text) => {
                tracing::warn!("Device error: {}", text);
                Some(ScannerEvent::DeviceError(text.clone()))
            }
            Message::Status(text) => {
                tracing::info!("Device status: {}", text);
                Some(ScannerEvent::Status(text.clone()))
            }
            Message::Ready => {
                tracing::info!("Scanner controller ready");
                let device = self.state.update(|s| {
                    s.device.connected = true;
                    s.device.clone()
                });
                Some(ScannerEvent::DeviceState(device))
            }
            Message::Unrecognized(line) => {
                tracing::debug!("Unrecognized message: {:?}", line);
                None
            }
            Message::Malformed(line) => {
                tracing::debug!("Dropping malformed message: {:?}", line);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::mapping::TurntableRig;
    use proptest::prelude::*;
    use scanner3d_data::DeviceState;

    fn interpreter() -> (Interpreter, SharedState) {
        let state = SharedState::new(EventBus::new(64));
        let interpreter = Interpreter::new(state.clone(), Box::new(TurntableRig::default()));
        (interpreter, state)
    }

    #[test]
    fn test_pos_updates_state_without_sample() {
        let (interpreter, state) = interpreter();
        interpreter.process_line("POS 100 60 40");
        let device = state.device();
        assert!(f64::abs(device.base_rotation - 180.) < 1e-9);
        assert_eq!(device.sensor_height, 60.);
        assert_eq!(device.distance, 40);
        assert!(state.drain_points().is_empty());
    }

    #[test]
    fn test_posx_appends_sample() {
        let (interpreter, state) = interpreter();
        interpreter.process_line("POSX 5 30 102");
        interpreter.process_line("POSX 10 30 82");
        interpreter.process_line("POSX 10 150 82");

        let samples = state.drain_points();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].height, 1.);
        assert_eq!(samples[0].point.radius, 1.);
        assert!(f64::abs(samples[0].point.angle - 9.) < 1e-9);
        assert_eq!(samples[1].point.radius, 2.);

        // the out-of-range line still moves the rig
        assert_eq!(state.device().sensor_height, 150.);
    }

    #[test]
    fn test_ready_marks_connected() {
        let (interpreter, state) = interpreter();
        assert!(!state.device().connected);
        assert_eq!(
            interpreter.process_line("3D Scanner Controller Ready"),
            Message::Ready
        );
        assert!(state.device().connected);
    }

    #[test]
    fn test_error_and_status_are_published() {
        let (interpreter, state) = interpreter();
        let subscription = state.subscribe();
        interpreter.link_changed(true);
        interpreter.process_line("ERROR Unknown command 'foo'");
        interpreter.process_line("STATUS homing");
        interpreter.process_line("OK");

        let events: Vec<ScannerEvent> = subscription.receiver.try_iter().collect();
        assert_eq!(events[0], ScannerEvent::Link { connected: true });
        assert!(matches!(events[1], ScannerEvent::DeviceState(_)));
        assert_eq!(
            &events[2..],
            &[
                ScannerEvent::DeviceError("Unknown command 'foo'".to_string()),
                ScannerEvent::Status("homing".to_string()),
                ScannerEvent::Acknowledged,
            ]
        );
        // device errors leave connectivity alone
        assert!(state.device().connected);
    }

    #[test]
    fn test_malformed_and_unknown_lines_change_nothing() {
        let (interpreter, state) = interpreter();
        let subscription = state.subscribe();
        for line in ["POS 1 2", "POSX a b c", "POSX 1 2 3 4", "started", "Error"] {
            interpreter.process_line(line);
        }
        assert_eq!(state.device(), DeviceState::default());
        assert!(state.drain_points().is_empty());
        assert!(subscription.receiver.try_recv().is_err());
    }

    #[test]
    fn test_link_down_clears_connected() {
        let (interpreter, state) = interpreter();
        interpreter.process_line("3D Scanner Controller Ready");
        state.update(|s| s.device.scanning = true);
        interpreter.link_changed(false);
        let device = state.device();
        assert!(!device.connected);
        assert!(device.scanning);
    }

    proptest! {
        #[test]
        fn test_posx_filtering(base in 0i32..200, height in 0i32..300, distance in 0i32..2000) {
            let (interpreter, state) = interpreter();
            interpreter.process_line(&format!("POSX {base} {height} {distance}"));
            let samples = state.drain_points();
            if height <= 122 {
                prop_assert_eq!(samples.len(), 1);
                prop_assert_eq!(samples[0].point.angle, base as f64 * 1.8);
                prop_assert_eq!(samples[0].point.radius, (122 - distance) as f64 / 20.);
                prop_assert_eq!(samples[0].height, height as f64 / 30.);
            } else {
                prop_assert!(samples.is_empty());
            }
        }
    }
}
