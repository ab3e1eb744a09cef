//! Cable commutator driver: turns an orientation stream into unwinding
//! commands for a motorized commutator.
//!
//! Orientation samples are reduced to the rotation about the commutator
//! axis, unwrapped into incremental turns, and merged with enable and
//! indicator changes into the device's line protocol.

pub mod commutator;
pub mod config;
pub mod messages;
pub mod runtime;
