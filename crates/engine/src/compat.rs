//! Legacy single-list compatibility surface.
//!
//! Producers written against the old "declare one flat array of controls"
//! API participate as first-class menus through this adapter: each producer
//! gets a synthetic registry entry whose content is whatever it last
//! declared, plus optional per-session overrides installed by single-session
//! sends. Naming follows the declared leading group header when present,
//! falling back to the producer's own identity; a producer that collides on
//! both names is locked out for the process lifetime rather than retried.

use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};
use switchboard_proto::SessionId;
use tracing::{debug, error, info, warn};

use crate::control::Control;
use crate::core::{ActiveView, MenuEngine};
use crate::error::CompatError;
use crate::registry::{MenuSource, ProducerId, ProducerState};

/// Deterministic id for a synthetic menu, negative so it cannot clash with
/// explicitly authored ids or the reserved built-in ids.
fn producer_menu_id(name: &str) -> i64 {
	let mut hasher = FxHasher::default();
	hasher.write(name.as_bytes());
	-(1 + (hasher.finish() % (i32::MAX as u64 - 1)) as i64)
}

/// Splits a leading group header off as the menu's display name.
fn split_header_name(mut controls: Vec<Control>) -> (Option<String>, Vec<Control>) {
	if controls.first().is_some_and(Control::is_header) {
		let header = controls.remove(0);
		(Some(header.label), controls)
	} else {
		(None, controls)
	}
}

impl MenuEngine {
	/// Replaces a producer's declared control list.
	///
	/// Registers a synthetic menu on first declaration; afterwards the menu's
	/// content is swapped and every attached session rebuilt. Renaming the
	/// menu (via a changed leading header) invalidates previously issued
	/// namespaced ids, so built caches and synced marks are purged and
	/// attached sessions go through a fresh build-and-ack cycle.
	pub fn set_declared_controls(
		self: &Arc<Self>,
		producer: &ProducerId,
		controls: Vec<Control>,
	) -> Result<(), CompatError> {
		if !self.config.compat_enabled {
			debug!(%producer, "compatibility surface disabled, declaration ignored");
			return Ok(());
		}

		let key;
		let refresh_viewers: Vec<SessionId>;
		let refresh_hub: Vec<SessionId>;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			if state.locked_producers.contains(producer) {
				debug!(%producer, "locked producer declaration ignored");
				return Err(CompatError::ProducerLocked(producer.0.clone()));
			}

			let (header_name, content) = split_header_name(controls);

			if let Some(existing) = state.registry.producer_key(producer) {
				key = existing;
				let name_taken = header_name.as_ref().is_some_and(|n| {
					state.registry.get_by_name(n).is_some_and(|e| e.key != key)
				});
				let Some(entry) = state.registry.get_mut(key) else {
					return Ok(());
				};
				let MenuSource::Producer(p) = &mut entry.source else {
					return Ok(());
				};

				let mut renamed = false;
				if let Some(new_name) = header_name {
					if name_taken {
						warn!(
							%producer,
							name = %new_name,
							"declared menu name already taken, keeping previous name"
						);
					} else if new_name != p.name {
						debug!(%producer, from = %p.name, to = %new_name, "producer menu renamed");
						p.name = new_name;
						renamed = true;
					}
				}
				p.declared = content;
				if renamed {
					// The namespace offset moved with the name; every id this
					// menu ever issued is invalid now.
					entry.built.clear();
					entry.synced.clear();
				}

				refresh_viewers = state
					.sessions
					.iter()
					.filter(|(_, s)| s.view == ActiveView::Menu(key))
					.map(|(id, _)| *id)
					.collect();
				refresh_hub = hub_sessions(state);
			} else {
				let mut name = header_name.unwrap_or_else(|| producer.0.clone());
				if state.registry.get_by_name(&name).is_some() {
					warn!(
						%producer,
						name = %name,
						"menu name already registered, falling back to producer name"
					);
					name = producer.0.clone();
					if state.registry.get_by_name(&name).is_some() {
						error!(
							%producer,
							"producer name also taken, locking producer out of compatibility registration"
						);
						state.locked_producers.insert(producer.clone());
						return Err(CompatError::NameExhausted(producer.0.clone()));
					}
				}

				let id = producer_menu_id(&name);
				key = state.registry.register(MenuSource::Producer(ProducerState {
					producer: producer.clone(),
					name,
					id,
					declared: content,
					per_session: FxHashMap::default(),
				}))?;
				info!(%producer, ?key, "compatibility menu registered");

				refresh_viewers = Vec::new();
				refresh_hub = hub_sessions(state);
			}
		}

		for session in refresh_viewers {
			let _ = self.load_menu(session, Some(key));
		}
		for session in refresh_hub {
			let _ = self.load_menu(session, None);
		}
		Ok(())
	}

	/// The control list a producer last declared, if it has a menu.
	pub fn get_declared_controls(&self, producer: &ProducerId) -> Option<Vec<Control>> {
		let state = self.state.lock().unwrap();
		let key = state.registry.producer_key(producer)?;
		match &state.registry.get(key)?.source {
			MenuSource::Producer(p) => Some(p.declared.clone()),
			MenuSource::Authored { .. } => None,
		}
	}

	/// Installs a per-session override for a producer's menu and forces a
	/// reload of whatever the session is looking at.
	pub fn send_to_session(
		self: &Arc<Self>,
		producer: &ProducerId,
		session: SessionId,
		controls: Vec<Control>,
	) -> Result<(), CompatError> {
		if !self.config.compat_enabled {
			debug!(%producer, "compatibility surface disabled, send ignored");
			return Ok(());
		}

		let missing = {
			let state = self.state.lock().unwrap();
			state.registry.producer_key(producer).is_none()
		};
		if missing {
			warn!(
				%producer,
				?session,
				"single-session send without a registered menu, creating an empty one"
			);
			self.set_declared_controls(producer, Vec::new())?;
		}

		let key;
		let viewing;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			let Some(found) = state.registry.producer_key(producer) else {
				return Err(CompatError::ProducerLocked(producer.0.clone()));
			};
			key = found;
			if let Some(entry) = state.registry.get_mut(key)
				&& let MenuSource::Producer(p) = &mut entry.source
			{
				p.per_session.insert(session, controls);
			}
			viewing = state
				.sessions
				.get(&session)
				.is_some_and(|s| s.view == ActiveView::Menu(key));
		}

		if viewing {
			let _ = self.load_menu(session, Some(key));
		} else {
			let _ = self.load_menu(session, None);
		}
		Ok(())
	}
}

/// Sessions currently parked on the hub view.
fn hub_sessions(state: &crate::core::EngineState) -> Vec<SessionId> {
	state
		.sessions
		.iter()
		.filter(|(_, s)| s.view == ActiveView::Hub)
		.map(|(id, _)| *id)
		.collect()
}
