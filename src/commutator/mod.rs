// Commutator control module
//
// Provides:
// - Swing-twist extraction of the rotation about the commutator axis
// - Angle unwrapping into incremental turn commands
// - Command line encoding and the command multiplexer
// - The serial link and the session that ties it all together

pub mod command;
pub mod link;
pub mod mux;
pub mod session;
pub mod twist;
pub mod unwrap;

pub use command::{encode, Command};
pub use link::{CommandSink, LinkGuard, LogLink, SerialLink, TransportError};
pub use mux::CommandMultiplexer;
pub use session::{run_session, SessionError, SessionInputs, SessionReport};
pub use twist::{extract_twist, RotationAxis};
pub use unwrap::{unwrap_delta, wrap_delta, AngleUnwrapper, TurnTracker};
