//! Common test utilities and menu fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use switchboard_proto::{ClientValue, ControlEntry, ControlPayload, SessionId, ValueData};
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::control::{AfterInput, Control};
use crate::core::{ControlSink, MenuEngine};
use crate::error::SinkClosed;
use crate::menu::{Menu, SessionProfile};

/// One batch delivered through the sink.
pub struct SentBatch {
	pub session: SessionId,
	pub entries: Vec<ControlEntry>,
	pub version: u32,
}

/// Sink capturing every outbound batch on a channel.
struct TestSink {
	tx: mpsc::UnboundedSender<SentBatch>,
}

impl ControlSink for TestSink {
	fn send_controls(
		&self,
		session: SessionId,
		entries: Vec<ControlEntry>,
		version: u32,
	) -> Result<(), SinkClosed> {
		self.tx
			.send(SentBatch {
				session,
				entries,
				version,
			})
			.map_err(|_| SinkClosed)
	}
}

/// Engine plus the receiving end of its sink.
pub struct Harness {
	pub engine: Arc<MenuEngine>,
	pub sent: mpsc::UnboundedReceiver<SentBatch>,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(EngineConfig::default())
	}

	pub fn with_config(config: EngineConfig) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			engine: MenuEngine::new(config, Arc::new(TestSink { tx })),
			sent: rx,
		}
	}

	/// Connects a session with a default profile.
	pub fn connect(&self, id: u64) -> SessionId {
		let session = SessionId(id);
		self.engine
			.on_session_connected(session, SessionProfile::new(format!("player-{id}")));
		session
	}

	/// Connects a session with an elevated profile.
	pub fn connect_elevated(&self, id: u64) -> SessionId {
		let session = SessionId(id);
		self.engine
			.on_session_connected(session, SessionProfile::elevated(format!("mod-{id}")));
		session
	}

	/// Most recent batch sent to `session`, draining everything pending.
	pub fn last_batch(&mut self, session: SessionId) -> Option<SentBatch> {
		let mut last = None;
		while let Ok(batch) = self.sent.try_recv() {
			if batch.session == session {
				last = Some(batch);
			}
		}
		last
	}

	/// Discards everything pending on the sink.
	pub fn drain(&mut self) {
		while self.sent.try_recv().is_ok() {}
	}
}

/// Echoes an acquisition ack for every value-carrying entry of a batch.
pub fn echo_acks(engine: &Arc<MenuEngine>, session: SessionId, entries: &[ControlEntry]) {
	for entry in entries {
		let data = match &entry.payload {
			ControlPayload::Slider { value, .. } => ValueData::Slider(*value),
			ControlPayload::Dropdown { selected, .. } => ValueData::Dropdown(*selected),
			ControlPayload::TwoOption { second, .. } => ValueData::TwoOption(*second),
			ControlPayload::TextInput { value, .. } => ValueData::Text(value.clone()),
			_ => continue,
		};
		engine.on_client_input(session, ClientValue { id: entry.id, data });
	}
}

/// Wire id of the entry with the given label.
pub fn id_of(entries: &[ControlEntry], label: &str) -> i64 {
	entries
		.iter()
		.find(|e| e.label == label)
		.unwrap_or_else(|| panic!("no entry labelled {label:?}"))
		.id
}

pub fn has_label(entries: &[ControlEntry], label: &str) -> bool {
	entries.iter().any(|e| e.label == label)
}

// ── Menu fixtures ──

/// Top-level menu with a press-counting button and a keybind.
pub struct ToolsMenu {
	pub presses: Arc<AtomicU32>,
	pub keybind_uses: Arc<AtomicU32>,
}

impl ToolsMenu {
	pub fn new() -> (Self, Arc<AtomicU32>, Arc<AtomicU32>) {
		let presses = Arc::new(AtomicU32::new(0));
		let keybind_uses = Arc::new(AtomicU32::new(0));
		(
			Self {
				presses: Arc::clone(&presses),
				keybind_uses: Arc::clone(&keybind_uses),
			},
			presses,
			keybind_uses,
		)
	}
}

impl Menu for ToolsMenu {
	fn name(&self) -> &str {
		"Tools"
	}

	fn id(&self) -> i64 {
		5
	}

	fn controls(&self, _session: &SessionProfile) -> Vec<Control> {
		let presses = Arc::clone(&self.presses);
		let uses = Arc::clone(&self.keybind_uses);
		vec![
			Control::button("Do Thing", "Do").on_press(move |_| {
				presses.fetch_add(1, Ordering::SeqCst);
				Ok(AfterInput::Stay)
			}),
			Control::keybind("Quick Swap").on_key(move |_, pressed| {
				if pressed {
					uses.fetch_add(1, Ordering::SeqCst);
				}
				Ok(AfterInput::Stay)
			}),
		]
	}
}

/// Top-level menu whose controls all request acquisition acks.
pub struct AudioMenu;

impl Menu for AudioMenu {
	fn name(&self) -> &str {
		"Audio"
	}

	fn id(&self) -> i64 {
		7
	}

	fn controls(&self, _session: &SessionProfile) -> Vec<Control> {
		vec![
			Control::slider("Volume", 0.0, 10.0, 5.0),
			Control::text_input("Alias"),
		]
	}
}

/// Sub-menu of [`ToolsMenu`] sharing its id (ids are per sibling group).
pub struct ToolColorsMenu;

impl Menu for ToolColorsMenu {
	fn name(&self) -> &str {
		"Tool Colors"
	}

	fn id(&self) -> i64 {
		5
	}

	fn parent(&self) -> Option<crate::menu::MenuTy> {
		Some(crate::menu::MenuTy::of::<ToolsMenu>())
	}

	fn controls(&self, _session: &SessionProfile) -> Vec<Control> {
		vec![Control::button("Cycle Color", "Cycle")]
	}
}

/// Menu only elevated sessions may open.
pub struct AdminMenu;

impl Menu for AdminMenu {
	fn name(&self) -> &str {
		"Admin"
	}

	fn id(&self) -> i64 {
		9
	}

	fn check_access(&self, session: &SessionProfile) -> bool {
		session.elevated
	}

	fn controls(&self, _session: &SessionProfile) -> Vec<Control> {
		vec![Control::button("Kick All", "Kick")]
	}
}
