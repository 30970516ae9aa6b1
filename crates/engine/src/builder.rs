//! Per-session assembly of the control lists a client actually receives.
//!
//! `generate` flattens one menu into its client-visible list: pinned content,
//! navigation, the menu's own controls, then namespacing and the duplicate-id
//! guard. `merge_previous` implements the rebuild diff: ids the session has
//! already been sent keep their previously delivered descriptor so synced
//! values survive a refresh. The two aggregate views get their own builders
//! and are exempt from namespacing; their content is globally unique by
//! construction.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use switchboard_proto::SessionId;
use tracing::warn;

use crate::config::EngineConfig;
use crate::control::{AfterInput, Control, ControlBody};
use crate::menu::{MenuKey, SessionProfile};
use crate::registry::{MenuRegistry, PinSet, ProducerId};

/// Builds the flattened, namespaced, deduplicated list for one menu.
///
/// Callers guarantee `key` resolves; an unregistered key yields an empty list.
pub(crate) fn generate(
	registry: &MenuRegistry,
	pins: &IndexMap<ProducerId, PinSet>,
	config: &EngineConfig,
	key: MenuKey,
	session: SessionId,
	profile: &SessionProfile,
) -> Vec<Control> {
	let Some(entry) = registry.get(key) else {
		return Vec::new();
	};

	let mut out = Vec::new();
	for set in pins.values() {
		out.extend(set.top.iter().cloned());
	}

	if let Some(parent_ty) = entry.parent() {
		if let Some(parent) = registry.get_by_ty(parent_ty) {
			let parent_key = parent.key;
			out.push(
				Control::button(
					config.translation.return_to.format(parent.name()),
					config.translation.return_to.button.clone(),
				)
				.on_press(move |_| Ok(AfterInput::OpenMenu(parent_key))),
			);
		}
	} else if registry.accessible_top_level(session, profile).len() > 1 {
		out.push(
			Control::button(
				config.translation.return_to.format("Main Menu"),
				config.translation.return_to.button.clone(),
			)
			.on_press(|_| Ok(AfterInput::OpenMain)),
		);
	}

	let sub_menus: Vec<(MenuKey, String)> = match entry.ty() {
		Some(ty) => registry
			.iter()
			.filter(|e| e.parent() == Some(ty) && e.check_access(session, profile))
			.map(|e| (e.key, e.name().to_string()))
			.collect(),
		None => Vec::new(),
	};
	if !sub_menus.is_empty() {
		let header = &config.translation.submenu_header;
		let mut head = Control::group_header(header.label.clone());
		if let Some(hint) = &header.hint {
			head = head.with_hint(hint.clone());
		}
		out.push(head);
		for (sub_key, sub_name) in sub_menus {
			out.push(
				Control::button(
					config.translation.open_menu.format(&sub_name),
					config.translation.open_menu.button.clone(),
				)
				.on_press(move |_| Ok(AfterInput::OpenMenu(sub_key))),
			);
		}
	}

	out.push(Control::group_header(entry.name().to_string()));
	out.extend(entry.controls(profile));
	if let Some(extras) = entry.session_extras(session) {
		out.extend(extras.iter().cloned());
	}

	for set in pins.values() {
		out.extend(set.bottom.iter().cloned());
	}

	namespace_and_dedup(out, entry.hash(), entry.name())
}

/// Applies the namespace offset and drops duplicate non-header ids.
///
/// First occurrence wins. A drop is a developer error in the menu definition,
/// not a normal-path outcome, hence the warning.
fn namespace_and_dedup(controls: Vec<Control>, offset: i64, menu_name: &str) -> Vec<Control> {
	let mut seen = rustc_hash::FxHashSet::default();
	let mut out = Vec::with_capacity(controls.len());

	for mut control in controls {
		control.id += offset;
		if !control.is_header() && !seen.insert(control.id) {
			warn!(
				menu = menu_name,
				id = control.id,
				label = %control.label,
				"dropping control with duplicate id"
			);
			continue;
		}
		out.push(control);
	}
	out
}

/// Rebuild diff: keep the previously delivered descriptor for surviving ids.
///
/// Fresh entries whose id existed in `prev` are replaced by the old
/// descriptor, so client-synced values and handler identity carry over; ids
/// new to this build come from the fresh generation. An id only disappears
/// when the fresh generation no longer emits it.
pub(crate) fn merge_previous(fresh: Vec<Control>, prev: Vec<Control>) -> Vec<Control> {
	let mut by_id: FxHashMap<i64, Control> = prev.into_iter().map(|c| (c.id, c)).collect();
	fresh
		.into_iter()
		.map(|c| by_id.remove(&c.id).unwrap_or(c))
		.collect()
}

/// Builds the hub view: one open-button per accessible top-level menu.
pub(crate) fn hub_view(
	registry: &MenuRegistry,
	pins: &IndexMap<ProducerId, PinSet>,
	config: &EngineConfig,
	session: SessionId,
	profile: &SessionProfile,
) -> Vec<Control> {
	let mut out = Vec::new();
	for set in pins.values() {
		out.extend(set.top.iter().cloned());
	}

	for key in registry.accessible_top_level(session, profile) {
		let Some(entry) = registry.get(key) else {
			continue;
		};
		out.push(
			Control::button(
				config.translation.open_menu.format(entry.name()),
				config.translation.open_menu.button.clone(),
			)
			.on_press(move |_| Ok(AfterInput::OpenMenu(key))),
		);
	}

	for set in pins.values() {
		out.extend(set.bottom.iter().cloned());
	}

	namespace_and_dedup(out, 0, "Main Menu")
}

/// Builds the keybind overlay: every keybind already delivered to this
/// session across its accessible menus, ids left namespaced.
pub(crate) fn keybind_view(
	registry: &MenuRegistry,
	config: &EngineConfig,
	session: SessionId,
	profile: &SessionProfile,
) -> Vec<Control> {
	let header = &config.translation.keybind_header;
	let mut head = Control::group_header(header.label.clone());
	if let Some(hint) = &header.hint {
		head = head.with_hint(hint.clone());
	}

	let mut out = vec![head];
	for entry in registry.iter() {
		if !entry.check_access(session, profile) {
			continue;
		}
		if let Some(built) = entry.built.get(&session) {
			out.extend(
				built
					.iter()
					.filter(|c| matches!(c.body, ControlBody::Keybind { .. }))
					.cloned(),
			);
		}
	}
	out
}
