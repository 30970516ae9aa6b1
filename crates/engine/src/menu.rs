//! Menu definitions and identity.
//!
//! A [`Menu`] is a named, identified, possibly-parented collection of
//! controls generated per session. Implementations are registered explicitly
//! with [`MenuEngine::register_menu`](crate::core::MenuEngine::register_menu);
//! identity is fixed at registration time while generated content may vary
//! per call.

use std::any::TypeId;
use std::hash::Hasher;

use rustc_hash::FxHasher;
use switchboard_proto::SessionId;

use crate::control::Control;

/// Reserved menu id of the built-in hub (main) view.
pub const HUB_MENU_ID: i64 = 0;

/// Reserved menu id of the built-in keybind overlay.
pub const KEYBIND_MENU_ID: i64 = 1;

/// Modulus bounding namespace offsets.
const NAMESPACE_MOD: u64 = 100_000;

/// Deterministic namespace offset for a menu name.
///
/// Two menus numbering their controls locally (both starting at 1, say) would
/// collide in the flattened list a client sees; offsetting every non-aggregate
/// id by this value keeps them apart. Stable across processes for a given
/// name, which the client-echo reconciliation relies on.
pub fn namespace_hash(name: &str) -> i64 {
	let mut hasher = FxHasher::default();
	hasher.write(name.as_bytes());
	(hasher.finish() % NAMESPACE_MOD) as i64
}

/// Type token used for parent references between authored menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuTy(TypeId);

impl MenuTy {
	/// Token for menu type `M`.
	pub fn of<M: Menu + 'static>() -> Self {
		Self(TypeId::of::<M>())
	}
}

/// Stable handle to a registered menu.
///
/// Issued at registration; never reused within a process, so a key held
/// across an unregister simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MenuKey(pub(crate) u64);

/// Session facts available to access checks and generators.
#[derive(Debug, Clone)]
pub struct SessionProfile {
	/// Human-readable name, used in logs only.
	pub display_name: String,
	/// Whether the session holds elevated (moderator) privilege.
	pub elevated: bool,
}

impl SessionProfile {
	/// Builds a non-elevated profile.
	pub fn new(display_name: impl Into<String>) -> Self {
		Self {
			display_name: display_name.into(),
			elevated: false,
		}
	}

	/// Builds an elevated profile.
	pub fn elevated(display_name: impl Into<String>) -> Self {
		Self {
			display_name: display_name.into(),
			elevated: true,
		}
	}
}

/// A registrable menu.
///
/// Hooks and generators receive no engine handle and must not block; any
/// navigation a menu wants to trigger is expressed through the
/// [`AfterInput`](crate::control::AfterInput) value its control handlers
/// return.
pub trait Menu: Send + Sync {
	/// Globally unique, non-empty display name.
	fn name(&self) -> &str;

	/// Id, unique among siblings sharing the same parent. Must not be
	/// [`HUB_MENU_ID`] or [`KEYBIND_MENU_ID`].
	fn id(&self) -> i64;

	/// Parent menu type, if this menu is a sub-menu.
	fn parent(&self) -> Option<MenuTy> {
		None
	}

	/// Whether `session` may see and open this menu.
	fn check_access(&self, _session: &SessionProfile) -> bool {
		true
	}

	/// Generates this menu's own controls for a session.
	///
	/// Pure function of session state at call time; the engine caches built
	/// lists, the menu itself must not.
	fn controls(&self, session: &SessionProfile) -> Vec<Control>;

	/// Fired once when the menu is successfully registered.
	fn on_registered(&self) {}

	/// Fired when a session enters this menu.
	fn on_open(&self, _session: SessionId) {}

	/// Fired when a session leaves this menu.
	fn on_close(&self, _session: SessionId) {}
}
