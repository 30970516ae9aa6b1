//! Legacy single-list adapter behavior.

use switchboard_proto::{ClientValue, ValueData};

use super::helpers::{Harness, ToolsMenu, has_label, id_of};
use crate::control::Control;
use crate::core::ActiveView;
use crate::error::CompatError;
use crate::menu::namespace_hash;
use crate::registry::ProducerId;

fn declared_with_header(name: &str) -> Vec<Control> {
	vec![
		Control::group_header(name),
		Control::button("Do", "Do").with_id(1),
		Control::slider("Amt", 0.0, 10.0, 0.0).with_id(2),
	]
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn leading_header_names_the_menu_and_content_is_offset() {
	let mut h = Harness::new();
	let producer = ProducerId::new("legacy_plugin");
	h.engine
		.set_declared_controls(&producer, declared_with_header("Gadgets"))
		.unwrap();

	let key = h.engine.menu_named("Gadgets").expect("menu registered");
	let session = h.connect(1);
	// Only accessible top-level menu: the session lands in it after the
	// first ack cycle (one slider).
	let batch = h.last_batch(session).unwrap();
	super::helpers::echo_acks(&h.engine, session, &batch.entries);
	tokio::time::sleep(std::time::Duration::from_millis(50)).await;
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));

	// Exactly the declared controls, offset under the declared name.
	let offset = namespace_hash("Gadgets");
	assert_eq!(id_of(&batch.entries, "Do"), 1 + offset);
	assert_eq!(id_of(&batch.entries, "Amt"), 2 + offset);
	// The leading header was stripped from the content; the menu's own
	// header carries the name instead.
	assert!(has_label(&batch.entries, "Gadgets"));
}

#[tokio::test(flavor = "current_thread")]
async fn redeclaring_identical_content_changes_nothing() {
	let h = Harness::new();
	let producer = ProducerId::new("legacy_plugin");
	h.engine
		.set_declared_controls(&producer, declared_with_header("Gadgets"))
		.unwrap();
	let key = h.engine.menu_named("Gadgets").unwrap();
	let before = h.engine.menus();

	h.engine
		.set_declared_controls(&producer, declared_with_header("Gadgets"))
		.unwrap();

	assert_eq!(h.engine.menus(), before);
	assert_eq!(h.engine.menu_named("Gadgets"), Some(key));

	let declared = h.engine.get_declared_controls(&producer).unwrap();
	let labels: Vec<&str> = declared.iter().map(|c| c.label.as_str()).collect();
	assert_eq!(labels, ["Do", "Amt"]);
}

#[tokio::test(flavor = "current_thread")]
async fn name_collisions_fall_back_then_lock_the_producer() {
	let h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();

	// Declared name collides with the authored menu, falls back to the
	// producer's own name.
	let producer = ProducerId::new("toolsmith");
	h.engine
		.set_declared_controls(&producer, declared_with_header("Tools"))
		.unwrap();
	assert!(h.engine.menu_named("toolsmith").is_some());

	// A producer whose fallback name is also taken gets locked out.
	let squatter = ProducerId::new("Tools");
	assert_eq!(
		h.engine.set_declared_controls(&squatter, declared_with_header("Tools")),
		Err(CompatError::NameExhausted("Tools".to_string()))
	);
	assert_eq!(
		h.engine.set_declared_controls(&squatter, declared_with_header("Fresh Name")),
		Err(CompatError::ProducerLocked("Tools".to_string()))
	);
	assert!(h.engine.menu_named("Fresh Name").is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn single_session_send_overrides_for_that_session_only() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	h.engine.register_menu(super::helpers::AudioMenu).unwrap();

	let target = h.connect(1);
	let other = h.connect(2);
	h.drain();

	let producer = ProducerId::new("whisper");
	h.engine
		.send_to_session(&producer, target, vec![Control::button("Secret", "Shh").with_id(9)])
		.unwrap();

	// The synthetic menu exists but only the target session can see it.
	let key = h.engine.menu_named("whisper").expect("auto-created menu");
	let batch = h.last_batch(target).unwrap();
	assert!(has_label(&batch.entries, "Open whisper"));

	h.engine.load_menu(other, None).unwrap();
	let batch = h.last_batch(other).unwrap();
	assert!(!has_label(&batch.entries, "Open whisper"));
	assert!(h.engine.load_menu(other, Some(key)).is_err());

	// The target can open it and sees the per-session content.
	h.engine.load_menu(target, Some(key)).unwrap();
	let batch = h.last_batch(target).unwrap();
	assert_eq!(
		id_of(&batch.entries, "Secret"),
		9 + namespace_hash("whisper")
	);
}

#[tokio::test(flavor = "current_thread")]
async fn rename_while_attached_rebuilds_under_the_new_hash() {
	let mut h = Harness::new();
	let producer = ProducerId::new("legacy_plugin");
	h.engine
		.set_declared_controls(
			&producer,
			vec![Control::group_header("Alpha"), Control::button("Do", "Do").with_id(1)],
		)
		.unwrap();
	let key = h.engine.menu_named("Alpha").unwrap();

	let session = h.connect(1);
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));
	h.drain();

	h.engine
		.set_declared_controls(
			&producer,
			vec![Control::group_header("Beta"), Control::button("Do", "Do").with_id(1)],
		)
		.unwrap();

	assert!(h.engine.menu_named("Alpha").is_none());
	assert_eq!(h.engine.menu_named("Beta"), Some(key));
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));

	// The attached session was rebuilt under the new offset; ids issued
	// under the old name are stale now.
	let batch = h.last_batch(session).unwrap();
	assert_eq!(id_of(&batch.entries, "Do"), 1 + namespace_hash("Beta"));

	h.engine.on_client_input(
		session,
		ClientValue {
			id: 1 + namespace_hash("Alpha"),
			data: ValueData::Pressed,
		},
	);
	// Still attached, nothing crashed, and the stale id changed nothing.
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));
}
