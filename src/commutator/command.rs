// Device command set and its line encoding
//
// Wire grammar, one command per line:
//   {turn: <number>} | {enable: <true|false>} | {led: <true|false>}

use std::fmt;

/// A command for the commutator controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Relative rotation in turns (sign gives direction)
    Turn(f64),
    /// Motor enable
    Enable(bool),
    /// Indicator LED
    Indicator(bool),
}

impl Command {
    /// Whether this command is worth sending at all.
    ///
    /// Zero and non-finite turns are no-ops for the device.
    pub fn is_transmittable(&self) -> bool {
        match *self {
            Command::Turn(turns) => turns.is_finite() && turns != 0.0,
            Command::Enable(_) | Command::Indicator(_) => true,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Turn(turns) => write!(f, "{{turn: {}}}", turns),
            Command::Enable(on) => write!(f, "{{enable: {}}}", on),
            Command::Indicator(on) => write!(f, "{{led: {}}}", on),
        }
    }
}

/// Encode a command as one wire line (without terminator).
///
/// Returns `None` for commands that must never reach the device.
pub fn encode(command: &Command) -> Option<String> {
    command.is_transmittable().then(|| command.to_string())
}
