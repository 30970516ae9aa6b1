//! Menu multiplexing engine over a shared settings-sync channel.
//!
//! # Purpose
//!
//! - Define the engine that multiplexes many independent logical menus onto
//!   one flat per-client control list without id collisions.
//! - Describe per-session navigation state, the load handshake (send, wait
//!   for client echoes, reconcile), and input dispatch back to control
//!   handlers.
//! - Exclude the transport itself; delivery goes through [`ControlSink`] and
//!   inbound events arrive via the `on_*` entry points.
//!
//! # Mental model
//!
//! - The engine is a single shared value ([`MenuEngine`]) owning all mutable
//!   state behind one lock; every inbound event serializes through it.
//! - Each session is always on exactly one view: the hub (main navigation),
//!   the keybind overlay (settings tab closed), or a registered menu.
//! - A menu's controls are numbered locally by its author; the builder offsets
//!   them by a deterministic hash of the menu name so lists from different
//!   menus can share the channel.
//! - The first time a session loads a menu, value-carrying controls must be
//!   echoed back by the client before the menu counts as open; echoes seed
//!   the server-side descriptor values.
//! - Rebuilds substitute previously delivered descriptors for surviving ids,
//!   so a refresh never resets what the client already typed.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints |
//! |---|---|---|
//! | [`MenuEngine`] | Authoritative engine state machine | sole owner of registry/session maps |
//! | [`EngineState`] | Locked interior state | only accessed under the engine lock, never across sink sends |
//! | [`SessionState`] | One connected session | removed on disconnect; cancel token fires first |
//! | [`AckCollect`] | Pending first-encounter echo buffer | appended by input path, drained once by the owning wait task |
//! | [`ActiveView`] | Where a session currently is | `Menu` keys must resolve or input is discarded as stale |
//! | [`ControlSink`] | Outbound write path | the only way controls reach a client |
//!
//! # Invariants
//!
//! 1. Every id in a delivered list is unique among non-header controls.
//!    - Enforced in: `builder::namespace_and_dedup`
//!    - Failure symptom: client input resolves to the wrong control.
//! 2. A rebuild never replaces a surviving control's descriptor with a fresh
//!    one; the previously delivered descriptor is reused.
//!    - Enforced in: `builder::merge_previous`
//!    - Failure symptom: user-entered values silently reset on unrelated
//!      refreshes.
//! 3. A session's ack buffer is drained exactly once, by the wait task that
//!    created it; a newer load supersedes the old collection wholesale.
//!    - Enforced in: `MenuEngine::finish_ack` (menu key check)
//!    - Failure symptom: echoes from an abandoned load seed the wrong menu.
//! 4. No handler, generator, or lifecycle hook can re-enter the engine lock;
//!    navigation is expressed through returned [`AfterInput`] values.
//!    - Enforced in: handler signatures (no engine handle)
//!    - Failure symptom: deadlock on the state lock.
//! 5. Sink send failure triggers authoritative session cleanup.
//!    - Enforced in: `MenuEngine::send_or_cleanup`
//!    - Failure symptom: dead sessions accumulate ack waits and caches.
//! 6. After disconnect, no callback fires for that session and every
//!    per-session cache is purged.
//!    - Enforced in: `MenuEngine::on_session_disconnected`,
//!      `MenuRegistry::purge_session`, the session cancel token.
//!
//! # Concurrency and ordering
//!
//! - All entry points lock, mutate, and release before sending to the sink or
//!   invoking user code; the guard is never held across an await.
//! - Events for one session are processed in arrival order; events across
//!   sessions have no mutual order.
//! - Ack waits run as spawned tasks polling under the lock at a fixed
//!   interval with a hard deadline; session disconnect cancels them through
//!   the session token.

mod dispatch;
mod session;
mod sync;

#[cfg(test)]
mod tests;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use switchboard_proto::{ClientValue, ControlEntry, PROTOCOL_VERSION, SessionId, ValueData};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::control::Control;
use crate::error::{RegistryError, SinkClosed};
use crate::menu::{Menu, MenuKey, MenuTy, SessionProfile};
use crate::registry::{MenuRegistry, MenuSource, PinSet, ProducerId};

/// Bound on the first-encounter ack collection wait.
pub(crate) const ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval of the ack wait task.
pub(crate) const ACK_POLL: Duration = Duration::from_millis(10);

/// Reserved wire id of the error-panel reload button.
pub const RELOAD_ID: i64 = -999;

/// Reserved wire id of the error-panel text block.
pub const ERROR_PANEL_ID: i64 = -5;

/// Outbound write path to one client.
///
/// Implementations must be cheap and non-blocking; an `Err` means the peer is
/// gone and triggers session cleanup.
pub trait ControlSink: Send + Sync {
	/// Delivers a full control list to a session.
	fn send_controls(
		&self,
		session: SessionId,
		entries: Vec<ControlEntry>,
		version: u32,
	) -> Result<(), SinkClosed>;
}

/// Which view a session currently sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
	/// The hub: one open-button per accessible top-level menu.
	Hub,
	/// Keybind-only overlay shown while the settings tab is closed.
	KeybindOverlay,
	/// A registered menu.
	Menu(MenuKey),
}

/// Pending first-encounter echo collection for one menu load.
pub(crate) struct AckCollect {
	pub menu: MenuKey,
	pub expected: usize,
	pub received: Vec<ClientValue>,
}

/// Per-session engine state.
pub(crate) struct SessionState {
	pub profile: SessionProfile,
	pub view: ActiveView,
	pub tab_open: bool,
	/// View to restore when the settings tab reopens.
	pub last_view: Option<ActiveView>,
	pub ack: Option<AckCollect>,
	/// Built list backing the hub / keybind overlay views.
	pub view_built: Vec<Control>,
	pub cancel: CancellationToken,
}

impl SessionState {
	fn new(profile: SessionProfile) -> Self {
		Self {
			profile,
			view: ActiveView::Hub,
			tab_open: true,
			last_view: None,
			ack: None,
			view_built: Vec::new(),
			cancel: CancellationToken::new(),
		}
	}
}

/// Locked interior of the engine.
#[derive(Default)]
pub(crate) struct EngineState {
	pub registry: MenuRegistry,
	pub pins: IndexMap<ProducerId, PinSet>,
	pub sessions: FxHashMap<SessionId, SessionState>,
	/// Producers locked out of compatibility registration for the process
	/// lifetime after repeated name collisions.
	pub locked_producers: FxHashSet<ProducerId>,
}

/// The engine. Share as `Arc<MenuEngine>`; all entry points take `&self` or
/// `&Arc<Self>` and serialize through the interior lock.
///
/// Loads that start an ack collection spawn a tokio task, so entry points
/// must be called from within a tokio runtime.
pub struct MenuEngine {
	pub(crate) state: Mutex<EngineState>,
	pub(crate) config: EngineConfig,
	pub(crate) sink: Arc<dyn ControlSink>,
}

impl MenuEngine {
	/// Creates an engine delivering controls through `sink`.
	pub fn new(config: EngineConfig, sink: Arc<dyn ControlSink>) -> Arc<Self> {
		Arc::new(Self {
			state: Mutex::new(EngineState::default()),
			config,
			sink,
		})
	}

	/// The configuration this engine was built with.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Registers a menu. Rejection leaves the registry unchanged.
	pub fn register_menu<M: Menu + 'static>(&self, menu: M) -> Result<MenuKey, RegistryError> {
		let name = menu.name().to_string();
		let mut state = self.state.lock().unwrap();
		state
			.registry
			.register(MenuSource::Authored {
				ty: MenuTy::of::<M>(),
				menu: Arc::new(menu),
			})
			.inspect_err(|err| error!(menu = %name, %err, "menu registration rejected"))
	}

	/// Unregisters a menu; sessions viewing it return to the main view.
	pub fn unregister_menu(self: &Arc<Self>, key: MenuKey) -> bool {
		let viewers: Vec<SessionId>;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			let Some(entry) = state.registry.unregister(key) else {
				return false;
			};
			viewers = state
				.sessions
				.iter()
				.filter(|(_, s)| s.view == ActiveView::Menu(key))
				.map(|(id, _)| *id)
				.collect();
			for &session in &viewers {
				entry.on_close(session);
				// Snap to the hub right away; the follow-up load may park on
				// an ack cycle and must not leave a dangling key behind.
				if let Some(sess) = state.sessions.get_mut(&session) {
					sess.view = ActiveView::Hub;
					sess.view_built = Vec::new();
				}
			}
			info!(menu = entry.name(), "menu unregistered");
		}
		for session in viewers {
			let _ = self.load_menu(session, None);
		}
		true
	}

	/// Unregisters every menu; all sessions fall back to an empty hub.
	pub fn unregister_all_menus(self: &Arc<Self>) {
		let sessions: Vec<SessionId>;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			for (&session, sess) in &mut state.sessions {
				if let ActiveView::Menu(menu_key) = sess.view
					&& let Some(entry) = state.registry.get(menu_key)
				{
					entry.on_close(session);
				}
				sess.view = ActiveView::Hub;
				sess.view_built = Vec::new();
			}
			sessions = state.sessions.keys().copied().collect();
			state.registry = MenuRegistry::default();
		}
		for session in sessions {
			let _ = self.load_menu(session, None);
		}
	}

	/// Installs (or replaces) a producer's pinned controls.
	pub fn register_pins(&self, producer: ProducerId, pins: PinSet) {
		let mut state = self.state.lock().unwrap();
		state.pins.insert(producer, pins);
	}

	/// Removes a producer's pinned controls.
	pub fn unregister_pins(&self, producer: &ProducerId) {
		let mut state = self.state.lock().unwrap();
		state.pins.shift_remove(producer);
	}

	/// Key of the registered menu of type `M`, if any.
	pub fn menu_key_of<M: Menu + 'static>(&self) -> Option<MenuKey> {
		let state = self.state.lock().unwrap();
		state.registry.get_by_ty(MenuTy::of::<M>()).map(|e| e.key)
	}

	/// Key of the registered menu with the given name, if any.
	pub fn menu_named(&self, name: &str) -> Option<MenuKey> {
		let state = self.state.lock().unwrap();
		state.registry.get_by_name(name).map(|e| e.key)
	}

	/// Key of the first registered menu with the given id, in display order.
	pub fn menu_with_id(&self, id: i64) -> Option<MenuKey> {
		let state = self.state.lock().unwrap();
		state.registry.get_by_id(id).map(|e| e.key)
	}

	/// The view a session currently sees.
	///
	/// Diagnostic read; snapshots taken here are eventually consistent with
	/// in-flight loads.
	pub fn current_view(&self, session: SessionId) -> Option<ActiveView> {
		let state = self.state.lock().unwrap();
		state.sessions.get(&session).map(|s| s.view)
	}

	/// Last synced value of one of a menu's controls for a session.
	///
	/// `local_id` is the id the menu assigned, before namespacing. Returns
	/// `None` for unknown controls and for kinds that carry no value.
	pub fn synced_value(
		&self,
		session: SessionId,
		key: MenuKey,
		local_id: i64,
	) -> Option<ValueData> {
		let state = self.state.lock().unwrap();
		let entry = state.registry.get(key)?;
		let wire = local_id + entry.hash();
		entry
			.built
			.get(&session)?
			.iter()
			.find(|c| c.id == wire && !c.is_header())?
			.current_value()
	}

	/// `(key, name, id)` of every registered menu, in display order.
	pub fn menus(&self) -> Vec<(MenuKey, String, i64)> {
		let state = self.state.lock().unwrap();
		state
			.registry
			.iter()
			.map(|e| (e.key, e.name().to_string(), e.id()))
			.collect()
	}

	/// Rebuilds and resends a session's current view.
	pub fn reload(self: &Arc<Self>, session: SessionId) {
		let view = {
			let state = self.state.lock().unwrap();
			state.sessions.get(&session).map(|s| s.view)
		};
		match view {
			Some(ActiveView::Menu(key)) => {
				let _ = self.load_menu(session, Some(key));
			}
			Some(ActiveView::Hub) => {
				let _ = self.load_menu(session, None);
			}
			Some(ActiveView::KeybindOverlay) => self.show_keybind_overlay(session),
			None => {}
		}
	}

	/// Reloads every connected session's current view.
	pub fn reload_all(self: &Arc<Self>) {
		let sessions: Vec<SessionId> = {
			let state = self.state.lock().unwrap();
			state.sessions.keys().copied().collect()
		};
		for session in sessions {
			self.reload(session);
		}
	}

	/// Reloads one menu for every session currently viewing it.
	pub fn reload_menu_for_all(self: &Arc<Self>, key: MenuKey) {
		let viewers: Vec<SessionId> = {
			let state = self.state.lock().unwrap();
			state
				.sessions
				.iter()
				.filter(|(_, s)| s.view == ActiveView::Menu(key))
				.map(|(id, _)| *id)
				.collect()
		};
		for session in viewers {
			let _ = self.load_menu(session, Some(key));
		}
	}

	/// Sends a list to a session, cleaning the session up if the sink is gone.
	pub(crate) fn send_or_cleanup(&self, session: SessionId, entries: Vec<ControlEntry>) {
		if self
			.sink
			.send_controls(session, entries, PROTOCOL_VERSION)
			.is_err()
		{
			warn!(?session, "session send failed, triggering cleanup");
			self.on_session_disconnected(session);
		}
	}

	/// Fires a menu's open hook, if it is still registered.
	pub(crate) fn fire_open(&self, session: SessionId, key: MenuKey) {
		let state = self.state.lock().unwrap();
		if let Some(entry) = state.registry.get(key) {
			entry.on_open(session);
		}
	}
}

/// Wire snapshots of a built list.
pub(crate) fn entries_of(list: &[Control]) -> Vec<ControlEntry> {
	list.iter().map(Control::to_entry).collect()
}
