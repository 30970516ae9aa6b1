//! Read-only engine configuration.
//!
//! The engine consumes an already-deserialized [`EngineConfig`]; loading it
//! from disk (and deciding the format) is the embedder's concern. Templates
//! use a literal `{}` placeholder substituted with a menu name.

use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Master switch; a disabled engine ignores session connects.
	pub enabled: bool,
	/// Whether the legacy single-list compatibility surface is active.
	pub compat_enabled: bool,
	/// Whether clients are shown an error panel when a handler fails.
	pub show_error_to_client: bool,
	/// Whether every client may see the full handler error text.
	pub show_full_error_to_client: bool,
	/// Whether elevated sessions may see the full handler error text.
	pub show_full_error_to_elevated: bool,
	/// Labels for built-in buttons and headers.
	pub translation: Translation,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			compat_enabled: true,
			show_error_to_client: true,
			show_full_error_to_client: false,
			show_full_error_to_elevated: true,
			translation: Translation::default(),
		}
	}
}

/// Translatable labels for the controls the engine injects itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Translation {
	/// Button opening a menu. `{}` = menu name.
	pub open_menu: ButtonText,
	/// Button returning to a parent menu or the main view. `{}` = menu name.
	pub return_to: ButtonText,
	/// Button on the error panel reloading the main view.
	pub reload: ButtonText,
	/// Header above the sub-menu navigation section.
	pub submenu_header: HeaderText,
	/// Header above the keybind overlay.
	pub keybind_header: HeaderText,
	/// Title of the client-visible error panel.
	pub server_error: String,
	/// Shown in place of error details the session may not see.
	pub no_permission: String,
}

impl Default for Translation {
	fn default() -> Self {
		Self {
			open_menu: ButtonText::new("Open {}", "Open"),
			return_to: ButtonText::new("Return to {}", "Return"),
			reload: ButtonText::new("Reload menus", "Reload"),
			submenu_header: HeaderText::new("Sub-Menus", None),
			keybind_header: HeaderText::new(
				"Global Keybinds",
				Some("Keybinds shared across menus"),
			),
			server_error: "Internal Server Error".to_string(),
			no_permission: "Insufficient permissions to view full error details".to_string(),
		}
	}
}

/// Label/button text pair for an injected button.
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonText {
	/// Row label; may contain a `{}` placeholder.
	pub label: String,
	/// Text on the button itself.
	pub button: String,
}

impl ButtonText {
	/// Builds a new pair.
	pub fn new(label: impl Into<String>, button: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			button: button.into(),
		}
	}

	/// Substitutes `{}` with `name`.
	pub fn format(&self, name: &str) -> String {
		self.label.replacen("{}", name, 1)
	}
}

/// Label/hint pair for an injected group header.
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderText {
	/// Header label.
	pub label: String,
	/// Optional hint shown with the header.
	pub hint: Option<String>,
}

impl HeaderText {
	/// Builds a new pair.
	pub fn new(label: impl Into<String>, hint: Option<&str>) -> Self {
		Self {
			label: label.into(),
			hint: hint.map(str::to_string),
		}
	}
}
