//! Shared wire types for the switchboard settings-sync channel.
//!
//! This crate defines the value types exchanged between the menu engine and
//! whatever transport delivers controls to connected clients. The engine only
//! ever speaks these types; framing and encoding are the transport's concern.

#![warn(missing_docs)]

pub mod types;

pub use types::*;

/// Protocol version stamped on every outbound batch of controls.
///
/// Bumped when the wire shape of [`ControlEntry`] changes incompatibly.
pub const PROTOCOL_VERSION: u32 = 2;
