//! Menu load and the first-encounter acknowledgement handshake.
//!
//! Loading a menu a session has already synced is a plain send. A first
//! encounter instead parks the echoes of value-carrying controls in the
//! session's ack buffer; a spawned wait task polls until the expected count
//! arrives or the deadline passes, then reconciles the echoed values into the
//! built list and opens the menu. The session's visible view only advances on
//! success.

use std::sync::Arc;

use switchboard_proto::{ControlEntry, SessionId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::{ACK_POLL, ACK_TIMEOUT, AckCollect, ActiveView, MenuEngine, SessionState, entries_of};
use crate::builder;
use crate::error::SyncError;
use crate::menu::MenuKey;
use crate::registry::MenuRegistry;

/// How an ack collection ended.
pub(crate) enum AckOutcome {
	/// Every expected echo arrived.
	Complete,
	/// The deadline passed first; the load is abandoned.
	TimedOut,
}

/// What `load_menu` decided to do once the lock is released.
enum Plan {
	SendView(Vec<ControlEntry>),
	Open {
		key: MenuKey,
		entries: Vec<ControlEntry>,
	},
	Await {
		key: MenuKey,
		entries: Vec<ControlEntry>,
		expected: usize,
		cancel: CancellationToken,
	},
}

impl MenuEngine {
	/// Loads `target` for a session; `None` resolves to the main view.
	///
	/// The main view is the single accessible top-level menu when exactly one
	/// exists, the hub otherwise.
	pub fn load_menu(
		self: &Arc<Self>,
		session: SessionId,
		target: Option<MenuKey>,
	) -> Result<(), SyncError> {
		let plan;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			let Some(sess) = state.sessions.get_mut(&session) else {
				return Err(SyncError::UnknownSession(session));
			};

			let key = match target {
				Some(key) => {
					if state.registry.get(key).is_none() {
						return Err(SyncError::UnknownMenu);
					}
					Some(key)
				}
				None => {
					let top = state.registry.accessible_top_level(session, &sess.profile);
					match top.as_slice() {
						[only] => Some(*only),
						_ => None,
					}
				}
			};

			if let Some(key) = key
				&& let Some(entry) = state.registry.get(key)
			{
				if !entry.check_access(session, &sess.profile) {
					warn!(
						session_name = %sess.profile.display_name,
						menu = entry.name(),
						"access denied loading menu"
					);
					return Err(SyncError::AccessDenied(entry.name().to_string()));
				}
			}

			close_current(&state.registry, sess, session);

			match key {
				None => {
					let list = builder::hub_view(
						&state.registry,
						&state.pins,
						&self.config,
						session,
						&sess.profile,
					);
					let entries = entries_of(&list);
					sess.view = ActiveView::Hub;
					sess.view_built = list;
					sess.ack = None;
					debug!(?session, menus = entries.len(), "hub view built");
					plan = Plan::SendView(entries);
				}
				Some(key) => {
					let fresh = builder::generate(
						&state.registry,
						&state.pins,
						&self.config,
						key,
						session,
						&sess.profile,
					);
					let Some(entry) = state.registry.get_mut(key) else {
						return Err(SyncError::UnknownMenu);
					};
					let list = match entry.built.remove(&session) {
						Some(prev) => builder::merge_previous(fresh, prev),
						None => fresh,
					};
					let entries = entries_of(&list);
					let first = !entry.synced.contains(&session);
					let expected = list.iter().filter(|c| c.wants_ack()).count();
					entry.built.insert(session, list);

					if first {
						sess.ack = Some(AckCollect {
							menu: key,
							expected,
							received: Vec::new(),
						});
						let cancel = sess.cancel.child_token();
						debug!(
							?session,
							menu = entry.name(),
							expected,
							"first encounter, collecting acknowledgements"
						);
						plan = Plan::Await {
							key,
							entries,
							expected,
							cancel,
						};
					} else {
						sess.view = ActiveView::Menu(key);
						sess.ack = None;
						plan = Plan::Open { key, entries };
					}
				}
			}
		}

		match plan {
			Plan::SendView(entries) => {
				self.send_or_cleanup(session, entries);
			}
			Plan::Open { key, entries } => {
				self.send_or_cleanup(session, entries);
				self.fire_open(session, key);
			}
			Plan::Await {
				key,
				entries,
				expected,
				cancel,
			} => {
				self.send_or_cleanup(session, entries);
				if expected == 0 {
					self.finish_ack(session, key, AckOutcome::Complete);
				} else {
					self.spawn_ack_wait(session, key, cancel);
				}
			}
		}
		Ok(())
	}

	/// Switches a session onto the keybind overlay.
	pub(crate) fn show_keybind_overlay(self: &Arc<Self>, session: SessionId) {
		let entries;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			let Some(sess) = state.sessions.get_mut(&session) else {
				return;
			};
			close_current(&state.registry, sess, session);
			let list = builder::keybind_view(&state.registry, &self.config, session, &sess.profile);
			entries = entries_of(&list);
			sess.view = ActiveView::KeybindOverlay;
			sess.view_built = list;
			sess.ack = None;
		}
		self.send_or_cleanup(session, entries);
	}

	/// Spawns the bounded wait for a session's first-encounter echoes.
	fn spawn_ack_wait(self: &Arc<Self>, session: SessionId, key: MenuKey, cancel: CancellationToken) {
		let engine = Arc::clone(self);
		tokio::spawn(async move {
			let deadline = tokio::time::Instant::now() + ACK_TIMEOUT;
			loop {
				{
					let state = engine.state.lock().unwrap();
					let Some(ack) = state.sessions.get(&session).and_then(|s| s.ack.as_ref())
					else {
						return;
					};
					// A newer load owns the buffer now.
					if ack.menu != key {
						return;
					}
					if ack.received.len() >= ack.expected {
						break;
					}
				}
				if tokio::time::Instant::now() >= deadline {
					engine.finish_ack(session, key, AckOutcome::TimedOut);
					return;
				}
				tokio::select! {
					() = cancel.cancelled() => return,
					() = tokio::time::sleep(ACK_POLL) => {}
				}
			}
			engine.finish_ack(session, key, AckOutcome::Complete);
		});
	}

	/// Resolves an ack collection: reconcile and open, or abandon.
	pub(crate) fn finish_ack(&self, session: SessionId, key: MenuKey, outcome: AckOutcome) {
		let mut state = self.state.lock().unwrap();
		let state = &mut *state;
		let Some(sess) = state.sessions.get_mut(&session) else {
			return;
		};
		let Some(ack) = sess.ack.take_if(|a| a.menu == key) else {
			return;
		};

		match outcome {
			AckOutcome::TimedOut => {
				error!(
					?session,
					received = ack.received.len(),
					expected = ack.expected,
					"timed out collecting control acknowledgements, load abandoned"
				);
			}
			AckOutcome::Complete => {
				let Some(entry) = state.registry.get_mut(key) else {
					return;
				};
				if let Some(built) = entry.built.get_mut(&session) {
					for value in &ack.received {
						match built.iter_mut().find(|c| c.id == value.id && !c.is_header()) {
							Some(control) => {
								if !control.apply_value(&value.data) {
									debug!(id = value.id, "echo value kind mismatch, ignored");
								}
							}
							None => debug!(id = value.id, "echo for unknown control, ignored"),
						}
					}
				}
				entry.synced.insert(session);
				sess.view = ActiveView::Menu(key);
				debug!(
					?session,
					menu = entry.name(),
					echoes = ack.received.len(),
					"menu synced and opened"
				);
				entry.on_open(session);
			}
		}
	}
}

/// Fires the close hook of the session's current menu, if still registered.
fn close_current(registry: &MenuRegistry, sess: &SessionState, session: SessionId) {
	if let ActiveView::Menu(key) = sess.view
		&& let Some(entry) = registry.get(key)
	{
		entry.on_close(session);
	}
}
