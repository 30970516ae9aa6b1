//! Client input routing.
//!
//! Inbound values either feed a pending ack collection, hit the reserved
//! reload id, or resolve against the built list of the session's current
//! view. Handlers run after the lock is released; whatever they return is
//! applied as a navigation step. Handler failures never propagate past the
//! dispatch boundary.

use std::sync::Arc;

use switchboard_proto::{ClientValue, SessionId, ValueData};
use tracing::{debug, error};

use super::{ActiveView, ERROR_PANEL_ID, MenuEngine, RELOAD_ID, entries_of};
use crate::control::{
	AfterInput, ButtonHandler, Control, ControlBody, DropdownHandler, KeybindHandler,
	SliderHandler, TextHandler, TwoOptionHandler,
};
use crate::error::HandlerError;

/// Handler plus decoded value, extracted under the lock and invoked outside it.
enum Invoke {
	Button(ButtonHandler),
	Slider(SliderHandler, f32),
	Dropdown(DropdownHandler, u32),
	TwoOption(TwoOptionHandler, bool),
	Text(TextHandler, String),
	Keybind(KeybindHandler, bool),
}

enum Action {
	ReloadMain,
	Invoke { invoke: Invoke, local_id: i64 },
}

impl MenuEngine {
	/// Routes one client value: buffer, special-case, dispatch, or discard.
	pub fn on_client_input(self: &Arc<Self>, session: SessionId, value: ClientValue) {
		let action;
		{
			let mut state = self.state.lock().unwrap();
			let state = &mut *state;
			let Some(sess) = state.sessions.get_mut(&session) else {
				debug!(?session, id = value.id, "input from unknown session discarded");
				return;
			};

			if let Some(ack) = &mut sess.ack {
				debug!(?session, id = value.id, "value buffered during ack collection");
				ack.received.push(value);
				return;
			}

			if value.id == RELOAD_ID {
				action = Action::ReloadMain;
			} else {
				let (list, offset) = match sess.view {
					ActiveView::Hub | ActiveView::KeybindOverlay => (&mut sess.view_built, 0),
					ActiveView::Menu(key) => {
						let Some(entry) = state.registry.get_mut(key) else {
							debug!(?session, id = value.id, "input for unregistered menu discarded");
							return;
						};
						let offset = entry.hash();
						match entry.built.get_mut(&session) {
							Some(built) => (built, offset),
							None => {
								debug!(?session, id = value.id, "input with no built list discarded");
								return;
							}
						}
					}
				};

				let Some(control) = list.iter_mut().find(|c| c.id == value.id && !c.is_header())
				else {
					debug!(?session, id = value.id, "stale or unknown control input discarded");
					return;
				};
				if !control.apply_value(&value.data) {
					debug!(
						?session,
						id = value.id,
						kind = control.kind_name(),
						"input value kind mismatch discarded"
					);
					return;
				}

				let Some(invoke) = extract(control, &value.data) else {
					debug!(?session, id = value.id, "control has no handler");
					return;
				};
				action = Action::Invoke {
					invoke,
					local_id: value.id - offset,
				};
			}
		}

		match action {
			Action::ReloadMain => {
				let _ = self.load_menu(session, None);
			}
			Action::Invoke { invoke, local_id } => {
				let result = match invoke {
					Invoke::Button(h) => h(session),
					Invoke::Slider(h, v) => h(session, v),
					Invoke::Dropdown(h, i) => h(session, i),
					Invoke::TwoOption(h, b) => h(session, b),
					Invoke::Text(h, s) => h(session, &s),
					Invoke::Keybind(h, p) => h(session, p),
				};
				match result {
					Ok(AfterInput::Stay) => {
						debug!(?session, id = local_id, "input handled");
					}
					Ok(AfterInput::OpenMenu(key)) => {
						let _ = self.load_menu(session, Some(key));
					}
					Ok(AfterInput::OpenMain) => {
						let _ = self.load_menu(session, None);
					}
					Ok(AfterInput::ReloadCurrent) => self.reload(session),
					Err(err) => self.report_handler_error(session, local_id, &err),
				}
			}
		}
	}

	/// Logs a handler failure and, when configured, shows the client a
	/// generic error panel with a reload button.
	fn report_handler_error(&self, session: SessionId, control_id: i64, err: &HandlerError) {
		error!(?session, id = control_id, %err, "control handler failed");
		if !self.config.show_error_to_client {
			return;
		}

		let elevated = {
			let state = self.state.lock().unwrap();
			let Some(sess) = state.sessions.get(&session) else {
				return;
			};
			sess.profile.elevated
		};
		let full_detail = self.config.show_full_error_to_client
			|| (elevated && self.config.show_full_error_to_elevated);
		let detail = if full_detail {
			err.to_string()
		} else {
			self.config.translation.no_permission.clone()
		};

		let t = &self.config.translation;
		let panel = [
			Control::text_display(format!("{}\n{detail}", t.server_error))
				.with_id(ERROR_PANEL_ID)
				.collapsed(),
			Control::button(t.reload.label.clone(), t.reload.button.clone()).with_id(RELOAD_ID),
		];
		self.send_or_cleanup(session, entries_of(&panel));
	}
}

/// Pairs a control's handler with the decoded value, if both line up.
fn extract(control: &Control, data: &ValueData) -> Option<Invoke> {
	match (&control.body, data) {
		(ControlBody::Button { on_press: Some(h), .. }, ValueData::Pressed) => {
			Some(Invoke::Button(h.clone()))
		}
		(ControlBody::Slider { on_change: Some(h), .. }, ValueData::Slider(v)) => {
			Some(Invoke::Slider(h.clone(), *v))
		}
		(ControlBody::Dropdown { on_change: Some(h), .. }, ValueData::Dropdown(i)) => {
			Some(Invoke::Dropdown(h.clone(), *i))
		}
		(ControlBody::TwoOption { on_change: Some(h), .. }, ValueData::TwoOption(b)) => {
			Some(Invoke::TwoOption(h.clone(), *b))
		}
		(ControlBody::TextInput { on_change: Some(h), .. }, ValueData::Text(s)) => {
			Some(Invoke::Text(h.clone(), s.clone()))
		}
		(ControlBody::Keybind { on_press: Some(h), .. }, ValueData::Keybind(p)) => {
			Some(Invoke::Keybind(h.clone(), *p))
		}
		_ => None,
	}
}
