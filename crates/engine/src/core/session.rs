//! Session lifecycle and tab-status tracking.
//!
//! Sessions are created on connect, cleaned up authoritatively on disconnect,
//! and shuffled between their current view and the keybind overlay as the
//! client's settings tab closes and reopens.

use std::sync::Arc;

use switchboard_proto::SessionId;
use tracing::{debug, info};

use super::{ActiveView, MenuEngine, SessionState};
use crate::menu::SessionProfile;

impl MenuEngine {
	/// Registers a session and performs its initial main-view load.
	pub fn on_session_connected(self: &Arc<Self>, session: SessionId, profile: SessionProfile) {
		if !self.config.enabled {
			debug!(?session, "engine disabled, ignoring session connect");
			return;
		}
		{
			let mut state = self.state.lock().unwrap();
			state.sessions.insert(session, SessionState::new(profile));
		}
		info!(?session, "session connected");
		let _ = self.load_menu(session, None);
	}

	/// Unregisters a session and purges every per-session cache.
	///
	/// Cancels any pending ack wait first; no callback fires for a
	/// disconnected session.
	pub fn on_session_disconnected(&self, session: SessionId) {
		let mut state = self.state.lock().unwrap();
		let Some(sess) = state.sessions.remove(&session) else {
			return;
		};
		sess.cancel.cancel();
		if let ActiveView::Menu(key) = sess.view
			&& let Some(entry) = state.registry.get(key)
		{
			entry.on_close(session);
		}
		state.registry.purge_session(session);
		drop(state);
		info!(?session, "session disconnected, state purged");
	}

	/// Tracks whether the session's settings tab is foregrounded.
	///
	/// Closing the tab parks the session on the keybind overlay so global
	/// keybinds keep receiving input; reopening restores the recorded view.
	pub fn on_tab_status(self: &Arc<Self>, session: SessionId, tab_open: bool) {
		enum Next {
			Overlay,
			Restore(Option<ActiveView>),
		}

		let next;
		{
			let mut state = self.state.lock().unwrap();
			let Some(sess) = state.sessions.get_mut(&session) else {
				return;
			};
			if sess.tab_open == tab_open {
				return;
			}
			sess.tab_open = tab_open;
			debug!(?session, tab_open, "tab status changed");

			if !tab_open {
				if matches!(sess.view, ActiveView::KeybindOverlay) {
					return;
				}
				sess.last_view = Some(sess.view);
				next = Next::Overlay;
			} else {
				next = Next::Restore(sess.last_view.take());
			}
		}

		match next {
			Next::Overlay => self.show_keybind_overlay(session),
			Next::Restore(Some(ActiveView::Menu(key))) => {
				let _ = self.load_menu(session, Some(key));
			}
			Next::Restore(_) => {
				let _ = self.load_menu(session, None);
			}
		}
	}
}
