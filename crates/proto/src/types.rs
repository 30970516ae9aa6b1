//! Wire types for controls, client echoes, and session identity.
//!
//! A [`ControlEntry`] is the serializable snapshot of one interactive element
//! as delivered to a client. A [`ClientValue`] is what comes back: either the
//! acquisition echo sent when a client first receives a value-carrying
//! control, or a live input event. Identity on both sides is the numeric
//! control id, already namespaced by the owning menu.

use serde::{Deserialize, Serialize};

/// Unique identifier for connected client sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Wire snapshot of one control as sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEntry {
	/// Namespaced control id; identity within one delivered list.
	pub id: i64,
	/// Display label.
	pub label: String,
	/// Optional hover/hint text.
	pub hint: Option<String>,
	/// Kind-specific fields.
	pub payload: ControlPayload,
}

/// Kind-specific wire fields of a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlPayload {
	/// A press-to-trigger button.
	Button {
		/// Text shown on the button itself.
		text: String,
		/// Hold duration required before the press registers, if any.
		hold_secs: Option<f32>,
	},
	/// A numeric slider.
	Slider {
		/// Lower bound.
		min: f32,
		/// Upper bound.
		max: f32,
		/// Current value.
		value: f32,
		/// Whether the value snaps to integers.
		integer: bool,
	},
	/// A single-choice dropdown.
	Dropdown {
		/// Choices in display order.
		options: Vec<String>,
		/// Index of the current selection.
		selected: u32,
	},
	/// A two-option toggle.
	TwoOption {
		/// First option label.
		option_a: String,
		/// Second option label.
		option_b: String,
		/// Whether the second option is currently selected.
		second: bool,
	},
	/// A free-text input field.
	TextInput {
		/// Current text.
		value: String,
		/// Maximum accepted length in characters, if bounded.
		char_limit: Option<u32>,
	},
	/// A read-only block of text (the label carries the content).
	TextDisplay {
		/// Whether the block starts collapsed.
		collapsed: bool,
	},
	/// A rebindable key.
	Keybind {
		/// Key name suggested to the client; not a default binding.
		suggested_key: Option<String>,
		/// Current pressed state.
		pressed: bool,
	},
	/// A section header separating groups of controls.
	GroupHeader {
		/// Whether vertical padding around the header is reduced.
		reduced_padding: bool,
	},
}

/// A client's echo of a control's current value, or a live input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientValue {
	/// Namespaced id of the control this value belongs to.
	pub id: i64,
	/// The value itself.
	pub data: ValueData,
}

/// Kind-specific client value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
	/// A button was pressed.
	Pressed,
	/// New slider value.
	Slider(f32),
	/// New dropdown selection index.
	Dropdown(u32),
	/// Two-option toggle state (`true` = second option).
	TwoOption(bool),
	/// New text input content.
	Text(String),
	/// Keybind pressed (`true`) or released (`false`).
	Keybind(bool),
}

/// Report of whether a client's settings tab is foregrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
	/// `true` while the settings UI is open on the client.
	pub tab_open: bool,
}
