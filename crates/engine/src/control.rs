//! Control descriptors and typed handler signatures.
//!
//! A [`Control`] wraps one interactive element: identity, display text, and a
//! kind-specific body carrying the last synced value plus an optional server
//! handler. Handlers never call back into the engine; they return an
//! [`AfterInput`] describing what should happen next and the dispatch path
//! applies it once the handler has returned.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::FxHasher;
use switchboard_proto::{ControlEntry, ControlPayload, SessionId, ValueData};

use crate::error::HandlerError;
use crate::menu::MenuKey;

/// Navigation request returned by a control handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterInput {
	/// Stay on the current view.
	#[default]
	Stay,
	/// Open a registered menu.
	OpenMenu(MenuKey),
	/// Return to the main view.
	OpenMain,
	/// Rebuild and resend the current view.
	ReloadCurrent,
}

/// Result of invoking a control handler.
pub type HandlerResult = Result<AfterInput, HandlerError>;

/// Handler invoked when a button is pressed.
pub type ButtonHandler = Arc<dyn Fn(SessionId) -> HandlerResult + Send + Sync>;
/// Handler invoked when a slider value changes.
pub type SliderHandler = Arc<dyn Fn(SessionId, f32) -> HandlerResult + Send + Sync>;
/// Handler invoked when a dropdown selection changes.
pub type DropdownHandler = Arc<dyn Fn(SessionId, u32) -> HandlerResult + Send + Sync>;
/// Handler invoked when a two-option toggle changes (`true` = second option).
pub type TwoOptionHandler = Arc<dyn Fn(SessionId, bool) -> HandlerResult + Send + Sync>;
/// Handler invoked when a text input changes.
pub type TextHandler = Arc<dyn Fn(SessionId, &str) -> HandlerResult + Send + Sync>;
/// Handler invoked when a keybind is pressed (`true`) or released (`false`).
pub type KeybindHandler = Arc<dyn Fn(SessionId, bool) -> HandlerResult + Send + Sync>;

/// Kind-specific body of a control.
#[derive(Clone)]
pub enum ControlBody {
	/// A press-to-trigger button.
	Button {
		/// Text on the button itself.
		text: String,
		/// Hold duration required before a press registers.
		hold_secs: Option<f32>,
		/// Invoked on press.
		on_press: Option<ButtonHandler>,
	},
	/// A numeric slider.
	Slider {
		/// Lower bound.
		min: f32,
		/// Upper bound.
		max: f32,
		/// Last synced value.
		value: f32,
		/// Whether the value snaps to integers.
		integer: bool,
		/// Invoked on change.
		on_change: Option<SliderHandler>,
	},
	/// A single-choice dropdown.
	Dropdown {
		/// Choices in display order.
		options: Vec<String>,
		/// Last synced selection index.
		selected: u32,
		/// Invoked on change.
		on_change: Option<DropdownHandler>,
	},
	/// A two-option toggle.
	TwoOption {
		/// First option label.
		option_a: String,
		/// Second option label.
		option_b: String,
		/// Last synced state (`true` = second option).
		second: bool,
		/// Invoked on change.
		on_change: Option<TwoOptionHandler>,
	},
	/// A free-text input field.
	TextInput {
		/// Last synced text.
		value: String,
		/// Maximum accepted length in characters.
		char_limit: Option<u32>,
		/// Invoked on change.
		on_change: Option<TextHandler>,
	},
	/// A read-only block of text; the label carries the content.
	TextDisplay {
		/// Whether the block starts collapsed.
		collapsed: bool,
	},
	/// A rebindable key.
	Keybind {
		/// Key name suggested to the client; not a default binding.
		suggested_key: Option<String>,
		/// Last synced pressed state.
		pressed: bool,
		/// Invoked on press/release.
		on_press: Option<KeybindHandler>,
	},
	/// A section header.
	GroupHeader {
		/// Whether vertical padding around the header is reduced.
		reduced_padding: bool,
	},
}

/// One interactive element with identity, display text, and behavior.
#[derive(Clone)]
pub struct Control {
	/// Control id; menu-local until the builder applies the namespace offset.
	pub id: i64,
	/// Display label.
	pub label: String,
	/// Optional hover/hint text.
	pub hint: Option<String>,
	/// Kind-specific fields and handler.
	pub body: ControlBody,
}

/// Derives a stable id from a label and kind tag when none is given.
fn auto_id(label: &str, tag: &str) -> i64 {
	let mut hasher = FxHasher::default();
	hasher.write(label.as_bytes());
	hasher.write(tag.as_bytes());
	// Positive, below the i32 range so the namespace offset never overflows.
	(hasher.finish() % i32::MAX as u64) as i64
}

impl Control {
	/// New button with an id derived from the label.
	pub fn button(label: impl Into<String>, text: impl Into<String>) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "Button"),
			label,
			hint: None,
			body: ControlBody::Button {
				text: text.into(),
				hold_secs: None,
				on_press: None,
			},
		}
	}

	/// New slider with an id derived from the label.
	pub fn slider(label: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "Slider"),
			label,
			hint: None,
			body: ControlBody::Slider {
				min,
				max,
				value: default,
				integer: false,
				on_change: None,
			},
		}
	}

	/// New dropdown with an id derived from the label.
	pub fn dropdown(label: impl Into<String>, options: Vec<String>) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "Dropdown"),
			label,
			hint: None,
			body: ControlBody::Dropdown {
				options,
				selected: 0,
				on_change: None,
			},
		}
	}

	/// New two-option toggle with an id derived from the label.
	pub fn two_option(
		label: impl Into<String>,
		option_a: impl Into<String>,
		option_b: impl Into<String>,
	) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "TwoOption"),
			label,
			hint: None,
			body: ControlBody::TwoOption {
				option_a: option_a.into(),
				option_b: option_b.into(),
				second: false,
				on_change: None,
			},
		}
	}

	/// New text input with an id derived from the label.
	pub fn text_input(label: impl Into<String>) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "TextInput"),
			label,
			hint: None,
			body: ControlBody::TextInput {
				value: String::new(),
				char_limit: None,
				on_change: None,
			},
		}
	}

	/// New read-only text block; `text` becomes the label.
	pub fn text_display(text: impl Into<String>) -> Self {
		let label = text.into();
		Self {
			id: auto_id(&label, "TextDisplay"),
			label,
			hint: None,
			body: ControlBody::TextDisplay { collapsed: false },
		}
	}

	/// New keybind with an id derived from the label.
	pub fn keybind(label: impl Into<String>) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "Keybind"),
			label,
			hint: None,
			body: ControlBody::Keybind {
				suggested_key: None,
				pressed: false,
				on_press: None,
			},
		}
	}

	/// New group header.
	pub fn group_header(label: impl Into<String>) -> Self {
		let label = label.into();
		Self {
			id: auto_id(&label, "GroupHeader"),
			label,
			hint: None,
			body: ControlBody::GroupHeader {
				reduced_padding: false,
			},
		}
	}

	/// Overrides the derived id.
	pub fn with_id(mut self, id: i64) -> Self {
		self.id = id;
		self
	}

	/// Sets the hint text.
	pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
		self.hint = Some(hint.into());
		self
	}

	/// Marks a text display as starting collapsed.
	pub fn collapsed(mut self) -> Self {
		match &mut self.body {
			ControlBody::TextDisplay { collapsed } => *collapsed = true,
			_ => debug_assert!(false, "collapsed on a non-text-display control"),
		}
		self
	}

	/// Attaches a press handler. Valid on buttons.
	pub fn on_press<F>(mut self, f: F) -> Self
	where
		F: Fn(SessionId) -> HandlerResult + Send + Sync + 'static,
	{
		match &mut self.body {
			ControlBody::Button { on_press, .. } => *on_press = Some(Arc::new(f)),
			_ => debug_assert!(false, "on_press on a non-button control"),
		}
		self
	}

	/// Attaches a value handler. Valid on sliders.
	pub fn on_value<F>(mut self, f: F) -> Self
	where
		F: Fn(SessionId, f32) -> HandlerResult + Send + Sync + 'static,
	{
		match &mut self.body {
			ControlBody::Slider { on_change, .. } => *on_change = Some(Arc::new(f)),
			_ => debug_assert!(false, "on_value on a non-slider control"),
		}
		self
	}

	/// Attaches a selection handler. Valid on dropdowns.
	pub fn on_select<F>(mut self, f: F) -> Self
	where
		F: Fn(SessionId, u32) -> HandlerResult + Send + Sync + 'static,
	{
		match &mut self.body {
			ControlBody::Dropdown { on_change, .. } => *on_change = Some(Arc::new(f)),
			_ => debug_assert!(false, "on_select on a non-dropdown control"),
		}
		self
	}

	/// Attaches a toggle handler. Valid on two-option controls.
	pub fn on_switch<F>(mut self, f: F) -> Self
	where
		F: Fn(SessionId, bool) -> HandlerResult + Send + Sync + 'static,
	{
		match &mut self.body {
			ControlBody::TwoOption { on_change, .. } => *on_change = Some(Arc::new(f)),
			_ => debug_assert!(false, "on_switch on a non-two-option control"),
		}
		self
	}

	/// Attaches a text handler. Valid on text inputs.
	pub fn on_text<F>(mut self, f: F) -> Self
	where
		F: Fn(SessionId, &str) -> HandlerResult + Send + Sync + 'static,
	{
		match &mut self.body {
			ControlBody::TextInput { on_change, .. } => *on_change = Some(Arc::new(f)),
			_ => debug_assert!(false, "on_text on a non-text-input control"),
		}
		self
	}

	/// Attaches a keybind handler. Valid on keybinds.
	pub fn on_key<F>(mut self, f: F) -> Self
	where
		F: Fn(SessionId, bool) -> HandlerResult + Send + Sync + 'static,
	{
		match &mut self.body {
			ControlBody::Keybind { on_press, .. } => *on_press = Some(Arc::new(f)),
			_ => debug_assert!(false, "on_key on a non-keybind control"),
		}
		self
	}

	/// Short kind name for logs.
	pub fn kind_name(&self) -> &'static str {
		match &self.body {
			ControlBody::Button { .. } => "button",
			ControlBody::Slider { .. } => "slider",
			ControlBody::Dropdown { .. } => "dropdown",
			ControlBody::TwoOption { .. } => "two-option",
			ControlBody::TextInput { .. } => "text-input",
			ControlBody::TextDisplay { .. } => "text-display",
			ControlBody::Keybind { .. } => "keybind",
			ControlBody::GroupHeader { .. } => "group-header",
		}
	}

	/// Whether this kind is exempt from the id-uniqueness guard.
	pub fn is_header(&self) -> bool {
		matches!(self.body, ControlBody::GroupHeader { .. })
	}

	/// Whether this control requests a client acquisition echo.
	///
	/// Value-carrying kinds do; the load path waits for their echoes before a
	/// first-encounter menu counts as open.
	pub fn wants_ack(&self) -> bool {
		matches!(
			self.body,
			ControlBody::Slider { .. }
				| ControlBody::Dropdown { .. }
				| ControlBody::TwoOption { .. }
				| ControlBody::TextInput { .. }
		)
	}

	/// Whether this control is a keybind.
	pub fn is_keybind(&self) -> bool {
		matches!(self.body, ControlBody::Keybind { .. })
	}

	/// Stores a client-synced value into the descriptor.
	///
	/// Returns `false` on a kind mismatch, which the caller treats as stale
	/// input.
	pub fn apply_value(&mut self, data: &ValueData) -> bool {
		match (&mut self.body, data) {
			(ControlBody::Button { .. }, ValueData::Pressed) => true,
			(ControlBody::Slider { value, .. }, ValueData::Slider(v)) => {
				*value = *v;
				true
			}
			(ControlBody::Dropdown { selected, .. }, ValueData::Dropdown(i)) => {
				*selected = *i;
				true
			}
			(ControlBody::TwoOption { second, .. }, ValueData::TwoOption(b)) => {
				*second = *b;
				true
			}
			(ControlBody::TextInput { value, .. }, ValueData::Text(s)) => {
				*value = s.clone();
				true
			}
			(ControlBody::Keybind { pressed, .. }, ValueData::Keybind(p)) => {
				*pressed = *p;
				true
			}
			_ => false,
		}
	}

	/// Last client-synced value carried by this control, if its kind has one.
	pub fn current_value(&self) -> Option<ValueData> {
		match &self.body {
			ControlBody::Slider { value, .. } => Some(ValueData::Slider(*value)),
			ControlBody::Dropdown { selected, .. } => Some(ValueData::Dropdown(*selected)),
			ControlBody::TwoOption { second, .. } => Some(ValueData::TwoOption(*second)),
			ControlBody::TextInput { value, .. } => Some(ValueData::Text(value.clone())),
			ControlBody::Keybind { pressed, .. } => Some(ValueData::Keybind(*pressed)),
			_ => None,
		}
	}

	/// Wire snapshot of this control.
	pub fn to_entry(&self) -> ControlEntry {
		let payload = match &self.body {
			ControlBody::Button { text, hold_secs, .. } => ControlPayload::Button {
				text: text.clone(),
				hold_secs: *hold_secs,
			},
			ControlBody::Slider {
				min,
				max,
				value,
				integer,
				..
			} => ControlPayload::Slider {
				min: *min,
				max: *max,
				value: *value,
				integer: *integer,
			},
			ControlBody::Dropdown {
				options, selected, ..
			} => ControlPayload::Dropdown {
				options: options.clone(),
				selected: *selected,
			},
			ControlBody::TwoOption {
				option_a,
				option_b,
				second,
				..
			} => ControlPayload::TwoOption {
				option_a: option_a.clone(),
				option_b: option_b.clone(),
				second: *second,
			},
			ControlBody::TextInput {
				value, char_limit, ..
			} => ControlPayload::TextInput {
				value: value.clone(),
				char_limit: *char_limit,
			},
			ControlBody::TextDisplay { collapsed } => ControlPayload::TextDisplay {
				collapsed: *collapsed,
			},
			ControlBody::Keybind {
				suggested_key,
				pressed,
				..
			} => ControlPayload::Keybind {
				suggested_key: suggested_key.clone(),
				pressed: *pressed,
			},
			ControlBody::GroupHeader { reduced_padding } => ControlPayload::GroupHeader {
				reduced_padding: *reduced_padding,
			},
		};

		ControlEntry {
			id: self.id,
			label: self.label.clone(),
			hint: self.hint.clone(),
			payload,
		}
	}
}

impl fmt::Debug for Control {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Control")
			.field("id", &self.id)
			.field("label", &self.label)
			.field("kind", &self.kind_name())
			.finish()
	}
}
