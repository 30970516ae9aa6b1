//! Load, ack collection, timeout, and tab-status behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use switchboard_proto::{ClientValue, PROTOCOL_VERSION, ValueData};

use super::helpers::{AdminMenu, AudioMenu, Harness, ToolsMenu, echo_acks, has_label, id_of};
use crate::control::{AfterInput, Control};
use crate::core::ActiveView;
use crate::error::SyncError;
use crate::menu::{Menu, SessionProfile};

/// Menu mixing an ack-requesting slider with a plain button.
struct MixedMenu {
	presses: Arc<AtomicU32>,
}

impl Menu for MixedMenu {
	fn name(&self) -> &str {
		"Mixed"
	}

	fn id(&self) -> i64 {
		11
	}

	fn controls(&self, _session: &SessionProfile) -> Vec<Control> {
		let presses = Arc::clone(&self.presses);
		vec![
			Control::slider("Amount", 0.0, 1.0, 0.5),
			Control::button("Fire", "Fire").on_press(move |_| {
				presses.fetch_add(1, Ordering::SeqCst);
				Ok(AfterInput::Stay)
			}),
		]
	}
}

#[tokio::test(flavor = "current_thread")]
async fn single_accessible_top_level_menu_opens_directly() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	let key = h.engine.register_menu(tools).unwrap();

	let session = h.connect(1);
	// Button-only menu: no acks to collect, opens synchronously.
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));

	let batch = h.last_batch(session).unwrap();
	assert!(has_label(&batch.entries, "Do Thing"));
	assert_eq!(batch.version, PROTOCOL_VERSION);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn first_encounter_waits_for_acks_then_opens() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	let audio = h.engine.register_menu(AudioMenu).unwrap();

	let session = h.connect(1);
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Hub));
	h.drain();

	h.engine.load_menu(session, Some(audio)).unwrap();
	let batch = h.last_batch(session).unwrap();

	// Controls are already delivered, but the menu is not open yet.
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Hub));

	echo_acks(&h.engine, session, &batch.entries);
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(audio)));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn partial_acks_time_out_and_leave_session_in_place() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	let audio = h.engine.register_menu(AudioMenu).unwrap();

	let session = h.connect(1);
	h.drain();
	h.engine.load_menu(session, Some(audio)).unwrap();
	let batch = h.last_batch(session).unwrap();

	// Echo the slider but not the text input: 1 of 2.
	let slider_id = id_of(&batch.entries, "Volume");
	h.engine.on_client_input(
		session,
		ClientValue {
			id: slider_id,
			data: ValueData::Slider(5.0),
		},
	);

	tokio::time::sleep(Duration::from_secs(11)).await;
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Hub));

	// The load is abandoned, not poisoned: a later attempt syncs fine.
	h.drain();
	h.engine.load_menu(session, Some(audio)).unwrap();
	let batch = h.last_batch(session).unwrap();
	echo_acks(&h.engine, session, &batch.entries);
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(audio)));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn second_load_skips_ack_collection() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	let audio = h.engine.register_menu(AudioMenu).unwrap();

	let session = h.connect(1);
	h.drain();
	h.engine.load_menu(session, Some(audio)).unwrap();
	let batch = h.last_batch(session).unwrap();
	echo_acks(&h.engine, session, &batch.entries);
	tokio::time::sleep(Duration::from_millis(50)).await;

	h.engine.load_menu(session, None).unwrap();
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Hub));

	// Already synced: no echoes needed this time.
	h.engine.load_menu(session, Some(audio)).unwrap();
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(audio)));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn inputs_during_collection_are_buffered_not_dispatched() {
	let mut h = Harness::new();
	let presses = Arc::new(AtomicU32::new(0));
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	let mixed = h
		.engine
		.register_menu(MixedMenu {
			presses: Arc::clone(&presses),
		})
		.unwrap();

	let session = h.connect(1);
	h.drain();
	h.engine.load_menu(session, Some(mixed)).unwrap();
	let batch = h.last_batch(session).unwrap();

	// A button press while the collection is pending is buffered, not run.
	let fire_id = id_of(&batch.entries, "Fire");
	h.engine.on_client_input(
		session,
		ClientValue {
			id: fire_id,
			data: ValueData::Pressed,
		},
	);
	assert_eq!(presses.load(Ordering::SeqCst), 0);

	echo_acks(&h.engine, session, &batch.entries);
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(mixed)));

	// Open now: the same press dispatches.
	h.engine.on_client_input(
		session,
		ClientValue {
			id: fire_id,
			data: ValueData::Pressed,
		},
	);
	assert_eq!(presses.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn disconnect_during_collection_abandons_the_wait() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	let audio = h.engine.register_menu(AudioMenu).unwrap();

	let session = h.connect(1);
	h.drain();
	h.engine.load_menu(session, Some(audio)).unwrap();

	h.engine.on_session_disconnected(session);
	tokio::time::sleep(Duration::from_secs(11)).await;

	assert_eq!(h.engine.current_view(session), None);
	assert_eq!(
		h.engine.load_menu(session, Some(audio)),
		Err(SyncError::UnknownSession(session))
	);
}

#[tokio::test(flavor = "current_thread")]
async fn access_denied_leaves_session_unchanged() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();
	h.engine.register_menu(AudioMenu).unwrap();
	let admin = h.engine.register_menu(AdminMenu).unwrap();

	let session = h.connect(1);
	h.drain();
	assert_eq!(
		h.engine.load_menu(session, Some(admin)),
		Err(SyncError::AccessDenied("Admin".to_string()))
	);
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Hub));

	// Elevated sessions pass the same check.
	let elevated = h.connect_elevated(2);
	h.engine.load_menu(elevated, Some(admin)).unwrap();
	assert_eq!(h.engine.current_view(elevated), Some(ActiveView::Menu(admin)));
}

#[tokio::test(flavor = "current_thread")]
async fn tab_close_parks_on_keybind_overlay_and_reopen_restores() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	let key = h.engine.register_menu(tools).unwrap();

	let session = h.connect(1);
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));
	h.drain();

	h.engine.on_tab_status(session, false);
	assert_eq!(
		h.engine.current_view(session),
		Some(ActiveView::KeybindOverlay)
	);
	let batch = h.last_batch(session).unwrap();
	// The overlay re-exposes the menu's keybind under its namespaced id.
	assert!(has_label(&batch.entries, "Quick Swap"));

	h.engine.on_tab_status(session, true);
	assert_eq!(h.engine.current_view(session), Some(ActiveView::Menu(key)));
}

#[tokio::test(flavor = "current_thread")]
async fn sink_failure_cleans_up_the_session() {
	let mut h = Harness::new();
	let (tools, _, _) = ToolsMenu::new();
	h.engine.register_menu(tools).unwrap();

	// Close the transport before anyone connects by dropping the original
	// receiver (replacing it closes the channel the sink sends on).
	let (_dead_tx, dead_rx) = tokio::sync::mpsc::unbounded_channel();
	h.sent = dead_rx;

	let session = h.connect(1);
	assert_eq!(h.engine.current_view(session), None);
}
