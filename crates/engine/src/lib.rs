//! Switchboard: a menu multiplexing engine for a shared settings-sync channel.
//!
//! Many independent logical menus (authored in-process or fed by legacy
//! single-list producers) are flattened onto one per-client control list.
//! The engine owns the menu registry, namespaces control ids so menus cannot
//! collide, tracks per-session navigation, reconciles client acknowledgements
//! on first load, and rebuilds without resetting user-entered values.
//!
//! Entry points live on [`MenuEngine`]; outbound delivery goes through the
//! [`ControlSink`] trait so the wire transport stays external.

mod builder;
mod compat;
pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod menu;
pub mod registry;

pub use config::{ButtonText, EngineConfig, HeaderText, Translation};
pub use control::{
	AfterInput, ButtonHandler, Control, ControlBody, DropdownHandler, HandlerResult,
	KeybindHandler, SliderHandler, TextHandler, TwoOptionHandler,
};
pub use self::core::{ActiveView, ControlSink, ERROR_PANEL_ID, MenuEngine, RELOAD_ID};
pub use error::{CompatError, HandlerError, RegistryError, SinkClosed, SyncError};
pub use menu::{
	HUB_MENU_ID, KEYBIND_MENU_ID, Menu, MenuKey, MenuTy, SessionProfile, namespace_hash,
};
pub use registry::{PinSet, ProducerId};
