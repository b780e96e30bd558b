pub(crate) const LINE_DELIMITER: u8 = b'\n';
pub(crate) const CARRIAGE_RETURN: u8 = b'\r';
// Longer partial lines are treated as noise and discarded.
pub(crate) const MAX_LINE_LENGTH: usize = 1024;
pub(crate) const READ_BUFFER_SIZE: usize = 256;

pub(crate) const MSG_POSITION: &str = "POS";
pub(crate) const MSG_POSITION_SAMPLE: &str = "POSX";
pub(crate) const MSG_OK: &str = "OK";
pub(crate) const MSG_ERROR: &str = "ERROR";
pub(crate) const MSG_STATUS: &str = "STATUS";
pub(crate) const MSG_READY: &str = "3D Scanner Controller Ready";
pub(crate) const N_POSITION_FIELDS: usize = 3;

pub(crate) const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub(crate) const DEFAULT_BAUD_RATE: u32 = 115_200;
pub(crate) const DEFAULT_READ_TIMEOUT_MS: u64 = 10;
pub(crate) const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 3000;
pub(crate) const DEFAULT_EVENT_CAPACITY: usize = 256;

// Specific for the reference rig: 200 steps per turn, 122 mm sensor travel
pub(crate) const DEFAULT_DEGREES_PER_STEP: f64 = 1.8;
pub(crate) const DEFAULT_TRAVEL_LIMIT: i32 = 122;
pub(crate) const DEFAULT_HEIGHT_DIVISOR: f64 = 30.;
pub(crate) const DEFAULT_RADIUS_DIVISOR: f64 = 20.;

// Lines waiting between the transport and interpreter threads.
pub(crate) const TRANSPORT_QUEUE_SIZE: usize = 200;
