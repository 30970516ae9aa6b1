//! Process-wide catalog of registered menus and producer pin sets.
//!
//! Entries are kept in display order: parent-less menus first, then
//! sub-menus, each group sorted by id. The order is observable (hub buttons
//! and the keybind overlay iterate it), so inserts keep it sorted rather than
//! sorting on read.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use switchboard_proto::SessionId;
use tracing::debug;

use crate::control::Control;
use crate::error::RegistryError;
use crate::menu::{HUB_MENU_ID, KEYBIND_MENU_ID, Menu, MenuKey, MenuTy, SessionProfile, namespace_hash};

/// Identity of a producer contributing pins or compatibility menus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(pub String);

impl ProducerId {
	/// Builds a producer identity.
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}
}

impl fmt::Display for ProducerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Controls a producer pins to the top and bottom of every menu.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
	/// Shown before everything else.
	pub top: Vec<Control>,
	/// Shown after everything else.
	pub bottom: Vec<Control>,
}

/// Mutable state of a synthetic menu owned by a legacy producer.
pub(crate) struct ProducerState {
	pub producer: ProducerId,
	pub name: String,
	pub id: i64,
	/// Content last declared through the compatibility surface.
	pub declared: Vec<Control>,
	/// Per-session overrides installed by single-session sends.
	pub per_session: FxHashMap<SessionId, Vec<Control>>,
}

/// Where a registry entry's definition comes from.
pub(crate) enum MenuSource {
	/// An explicitly registered [`Menu`] implementation.
	Authored { ty: MenuTy, menu: Arc<dyn Menu> },
	/// A synthetic menu fed by the compatibility adapter.
	Producer(ProducerState),
}

/// One registered menu plus its per-session delivery state.
pub(crate) struct MenuEntry {
	pub key: MenuKey,
	pub source: MenuSource,
	/// Last list actually delivered per session; the diff baseline on rebuild.
	pub built: FxHashMap<SessionId, Vec<Control>>,
	/// Sessions that have completed first-encounter ack collection.
	pub synced: FxHashSet<SessionId>,
}

impl MenuEntry {
	pub fn name(&self) -> &str {
		match &self.source {
			MenuSource::Authored { menu, .. } => menu.name(),
			MenuSource::Producer(p) => &p.name,
		}
	}

	pub fn id(&self) -> i64 {
		match &self.source {
			MenuSource::Authored { menu, .. } => menu.id(),
			MenuSource::Producer(p) => p.id,
		}
	}

	pub fn parent(&self) -> Option<MenuTy> {
		match &self.source {
			MenuSource::Authored { menu, .. } => menu.parent(),
			MenuSource::Producer(_) => None,
		}
	}

	/// Type token, present only for authored menus.
	pub fn ty(&self) -> Option<MenuTy> {
		match &self.source {
			MenuSource::Authored { ty, .. } => Some(*ty),
			MenuSource::Producer(_) => None,
		}
	}

	/// Namespace offset applied to this menu's control ids.
	pub fn hash(&self) -> i64 {
		namespace_hash(self.name())
	}

	pub fn check_access(&self, session: SessionId, profile: &SessionProfile) -> bool {
		match &self.source {
			MenuSource::Authored { menu, .. } => menu.check_access(profile),
			// Producer menus exist for a session once content was declared
			// for everyone or sent to that session specifically.
			MenuSource::Producer(p) => {
				!p.declared.is_empty()
					|| p.per_session.get(&session).is_some_and(|c| !c.is_empty())
			}
		}
	}

	/// The menu's own generated controls.
	pub fn controls(&self, profile: &SessionProfile) -> Vec<Control> {
		match &self.source {
			MenuSource::Authored { menu, .. } => menu.controls(profile),
			MenuSource::Producer(p) => p.declared.clone(),
		}
	}

	/// Per-session supplemental controls, if any.
	pub fn session_extras(&self, session: SessionId) -> Option<&[Control]> {
		match &self.source {
			MenuSource::Authored { .. } => None,
			MenuSource::Producer(p) => p.per_session.get(&session).map(Vec::as_slice),
		}
	}

	pub fn on_open(&self, session: SessionId) {
		if let MenuSource::Authored { menu, .. } = &self.source {
			menu.on_open(session);
		}
	}

	pub fn on_close(&self, session: SessionId) {
		if let MenuSource::Authored { menu, .. } = &self.source {
			menu.on_close(session);
		}
	}
}

/// Ordered catalog of registered menus.
#[derive(Default)]
pub(crate) struct MenuRegistry {
	entries: Vec<MenuEntry>,
	next_key: u64,
}

impl MenuRegistry {
	/// Validates and inserts a menu, returning its stable key.
	pub fn register(&mut self, source: MenuSource) -> Result<MenuKey, RegistryError> {
		let entry = MenuEntry {
			key: MenuKey(self.next_key),
			source,
			built: FxHashMap::default(),
			synced: FxHashSet::default(),
		};

		let name = entry.name().to_string();
		let id = entry.id();
		let parent = entry.parent();

		if name.is_empty() {
			return Err(RegistryError::EmptyName);
		}
		if id == HUB_MENU_ID || id == KEYBIND_MENU_ID {
			return Err(RegistryError::ReservedId(id));
		}
		if self.entries.iter().any(|e| e.name() == name) {
			return Err(RegistryError::DuplicateName(name));
		}
		if self
			.entries
			.iter()
			.any(|e| e.parent() == parent && e.id() == id)
		{
			return Err(RegistryError::DuplicateId(id));
		}
		if let Some(parent_ty) = parent
			&& self.get_by_ty(parent_ty).is_none()
		{
			return Err(RegistryError::UnknownParent(name));
		}

		let key = entry.key;
		self.next_key += 1;

		let rank = (parent.is_some(), id);
		let pos = self
			.entries
			.iter()
			.position(|e| (e.parent().is_some(), e.id()) > rank)
			.unwrap_or(self.entries.len());
		self.entries.insert(pos, entry);

		if let MenuSource::Authored { menu, .. } = &self.entries[pos].source {
			menu.on_registered();
		}
		debug!(menu = %name, id, ?key, "menu registered");

		Ok(key)
	}

	/// Removes an entry; the caller handles redirecting attached sessions.
	pub fn unregister(&mut self, key: MenuKey) -> Option<MenuEntry> {
		let pos = self.entries.iter().position(|e| e.key == key)?;
		Some(self.entries.remove(pos))
	}

	pub fn get(&self, key: MenuKey) -> Option<&MenuEntry> {
		self.entries.iter().find(|e| e.key == key)
	}

	pub fn get_mut(&mut self, key: MenuKey) -> Option<&mut MenuEntry> {
		self.entries.iter_mut().find(|e| e.key == key)
	}

	/// First entry of the given authored type, in display order.
	pub fn get_by_ty(&self, ty: MenuTy) -> Option<&MenuEntry> {
		self.entries.iter().find(|e| e.ty() == Some(ty))
	}

	/// First entry with the given id, in display order.
	pub fn get_by_id(&self, id: i64) -> Option<&MenuEntry> {
		self.entries.iter().find(|e| e.id() == id)
	}

	pub fn get_by_name(&self, name: &str) -> Option<&MenuEntry> {
		self.entries.iter().find(|e| e.name() == name)
	}

	/// Key of the entry owned by a compatibility producer, if registered.
	pub fn producer_key(&self, producer: &ProducerId) -> Option<MenuKey> {
		self.entries
			.iter()
			.find(|e| match &e.source {
				MenuSource::Producer(p) => &p.producer == producer,
				MenuSource::Authored { .. } => false,
			})
			.map(|e| e.key)
	}

	pub fn iter(&self) -> impl Iterator<Item = &MenuEntry> {
		self.entries.iter()
	}

	/// Keys of top-level menus this session may open, in display order.
	pub fn accessible_top_level(
		&self,
		session: SessionId,
		profile: &SessionProfile,
	) -> Vec<MenuKey> {
		self.entries
			.iter()
			.filter(|e| e.parent().is_none() && e.check_access(session, profile))
			.map(|e| e.key)
			.collect()
	}

	/// Drops every per-session trace of a disconnected session.
	pub fn purge_session(&mut self, session: SessionId) {
		for entry in &mut self.entries {
			entry.built.remove(&session);
			entry.synced.remove(&session);
			if let MenuSource::Producer(p) = &mut entry.source {
				p.per_session.remove(&session);
			}
		}
	}
}
