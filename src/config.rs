// Topics, serial defaults, session configuration

use crate::commutator::RotationAxis;

// Zenoh topics
pub const TOPIC_ORIENTATION: &str = "commutator/orientation"; // orientation samples
pub const TOPIC_CMD_ENABLE: &str = "commutator/cmd/enable"; // enable state changes
pub const TOPIC_CMD_LED: &str = "commutator/cmd/led"; // indicator state changes
pub const TOPIC_HEALTH: &str = "commutator/state/health"; // session status

// Serial port for the commutator controller
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 100;

// Every command line sent to the device ends with this
pub const LINE_TERMINATOR: &str = "\n";

// Rotation axis of the commutator in sensor coordinates (unit Z)
pub const DEFAULT_AXIS: [f64; 3] = [0.0, 0.0, 1.0];

// Device state sent as soon as the link opens
pub const DEFAULT_ENABLE: bool = true;
pub const DEFAULT_LED: bool = true;

// Turn increments waiting for the link before the session is declared stalled
pub const TURN_QUEUE_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Rotation axis must not be the zero vector")]
    ZeroAxis,

    #[error("Rotation axis has non-finite component: {0:?}")]
    NonFiniteAxis([f64; 3]),

    #[error("Turn queue depth must be at least 1")]
    QueueDepth,
}

/// Everything one streaming session needs, loaded once before it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub axis: [f64; 3],
    /// Serial port of the device. `None` runs against the logging link.
    pub port: Option<String>,
    pub baudrate: u32,
    pub enable: bool,
    pub led: bool,
    pub turn_queue_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            axis: DEFAULT_AXIS,
            port: Some(DEFAULT_PORT.to_string()),
            baudrate: DEFAULT_BAUDRATE,
            enable: DEFAULT_ENABLE,
            led: DEFAULT_LED,
            turn_queue_depth: TURN_QUEUE_DEPTH,
        }
    }
}

impl SessionConfig {
    /// Check the configuration and return the validated rotation axis.
    ///
    /// A session must not start (and must not open the link) when this fails.
    pub fn validate(&self) -> Result<RotationAxis, ConfigError> {
        if self.turn_queue_depth == 0 {
            return Err(ConfigError::QueueDepth);
        }
        RotationAxis::new(self.axis[0], self.axis[1], self.axis[2])
    }
}
