//! The switch engine: MRU bookkeeping plus the session state machine.
//!
//! All browser events for the process go through one [`Engine`]:
//!
//! * tab created / removed / manually activated update the MRU list directly
//! * switch commands start, continue, or replace a session
//! * deadline expiry ends the session and commits its last good step
//!
//! Host calls are awaited without holding any borrow of the engine state, so
//! other events may run in between. Every resume point re-checks that its
//! session is still the current one (by epoch), that no later command of the
//! same session has taken over (by step), and re-clamps the cursor.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::command::SwitchCommand;
use crate::config::SwitchConfig;
use crate::error::{HostError, Result};
use crate::host::{DeadlineTicket, Host, TabId, TabSnapshot};
use crate::mru::MruList;
use crate::session::{Session, StepOutcome, SwitchMode, SwitchState, clamp_cursor};

/// Process-wide switcher state behind a cheap, clonable handle.
///
/// Single-threaded by construction: clones share state through `Rc`.
pub struct Engine<H> {
	inner: Rc<Inner<H>>,
}

impl<H> Clone for Engine<H> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

struct Inner<H> {
	host: H,
	config: RefCell<SwitchConfig>,
	state: RefCell<State>,
}

#[derive(Debug, Default)]
struct State {
	mru: MruList,
	session: Option<Session>,
	initialized: bool,
	next_epoch: u64,
	next_ticket: u64,
}

impl State {
	/// Active session, but only if it is the one identified by `epoch`.
	fn session_mut(&mut self, epoch: u64) -> Option<&mut Session> {
		self.session.as_mut().filter(|s| s.epoch == epoch)
	}

	/// Active session, but only while `step` is still its latest step.
	fn step_mut(&mut self, epoch: u64, step: u64) -> Option<&mut Session> {
		self.session_mut(epoch).filter(|s| s.step == step)
	}

	/// Drops the entry at `index` and shifts session positions that pointed past it.
	fn forget_at(&mut self, index: usize) -> Option<TabId> {
		let tab = self.mru.remove_at(index)?;
		if let Some(session) = self.session.as_mut() {
			if index < session.cursor {
				session.cursor -= 1;
			}
			if index < session.committed {
				session.committed -= 1;
			} else if index == session.committed {
				session.committed = 0;
			}
		}
		Some(tab)
	}

	fn forget(&mut self, tab: TabId) -> Option<usize> {
		let index = self.mru.index_of(tab)?;
		self.forget_at(index);
		Some(index)
	}
}

impl<H: Host> Engine<H> {
	pub fn new(host: H, config: SwitchConfig) -> Self {
		Self {
			inner: Rc::new(Inner {
				host,
				config: RefCell::new(config),
				state: RefCell::new(State::default()),
			}),
		}
	}

	pub fn host(&self) -> &H {
		&self.inner.host
	}

	pub fn config(&self) -> SwitchConfig {
		self.inner.config.borrow().clone()
	}

	/// Replaces the settings. Takes effect from the next armed deadline.
	pub fn set_config(&self, config: SwitchConfig) {
		debug!(target = "clut.engine", ?config, "config updated");
		*self.inner.config.borrow_mut() = config;
	}

	fn state(&self) -> RefMut<'_, State> {
		self.inner.state.borrow_mut()
	}

	/// Snapshot of the MRU list, most recent first.
	pub fn mru(&self) -> Vec<TabId> {
		self.inner.state.borrow().mru.to_vec()
	}

	pub fn switch_state(&self) -> SwitchState {
		SwitchState::from(self.inner.state.borrow().session.as_ref().map(|s| s.mode))
	}

	pub fn is_switching(&self) -> bool {
		self.inner.state.borrow().session.is_some()
	}

	pub fn is_initialized(&self) -> bool {
		self.inner.state.borrow().initialized
	}

	/// Position being previewed, or `None` when idle.
	pub fn cursor(&self) -> Option<usize> {
		self.inner.state.borrow().session.as_ref().map(|s| s.cursor)
	}

	/// Position that would be committed if the deadline fired now.
	pub fn committed_cursor(&self) -> Option<usize> {
		self.inner.state.borrow().session.as_ref().map(|s| s.committed)
	}

	/// Currently armed deadline, if any.
	pub fn pending_deadline(&self) -> Option<DeadlineTicket> {
		self.inner.state.borrow().session.as_ref().and_then(|s| s.deadline)
	}

	/// Seeds the MRU list from the host's open windows.
	///
	/// Runs at most once per engine; later calls return the current size.
	/// On failure the engine stays uninitialized so a later trigger can retry.
	pub async fn initialize(&self) -> Result<usize> {
		{
			let mut state = self.state();
			if state.initialized {
				debug!(target = "clut.engine", tracked = state.mru.len(), "already initialized");
				return Ok(state.mru.len());
			}
			state.initialized = true;
		}

		let tabs = match self.inner.host.enumerate().await {
			Ok(tabs) => tabs,
			Err(err) => {
				warn!(target = "clut.engine", error = %err, "initialization failed");
				self.state().initialized = false;
				return Err(err.into());
			}
		};

		let mut state = self.state();
		if state.session.is_some() {
			self.end_session(&mut state, false);
		}
		let mut seeded = seed_order(&tabs);
		// Tabs created while enumeration was in flight may be missing from the snapshot.
		for tab in state.mru.iter() {
			seeded.push_back(tab);
		}
		state.mru = seeded;
		info!(target = "clut.engine", tracked = state.mru.len(), "MRU initialized");
		debug!(target = "clut.engine", mru = ?state.mru.to_vec());
		Ok(state.mru.len())
	}

	/// Discards all state, returning the engine to its freshly created form.
	pub fn reset(&self) {
		let mut state = self.state();
		self.end_session(&mut state, false);
		state.mru.clear();
		state.initialized = false;
		debug!(target = "clut.engine", "engine reset");
	}

	/// A new tab is the least recent until it is activated.
	pub fn on_tab_created(&self, tab: TabId) {
		if self.state().mru.push_back(tab) {
			debug!(target = "clut.engine", %tab, "tab created");
		}
	}

	/// Forgets a closed tab. Safe to call for tabs that are not tracked.
	pub fn on_tab_removed(&self, tab: TabId) {
		if let Some(index) = self.state().forget(tab) {
			debug!(target = "clut.engine", %tab, index, "tab removed");
		}
	}

	/// Handles a tab activation reported by the host.
	///
	/// While a session is running activations are echoes of the session's
	/// own steps and are ignored. Returns `true` if the MRU order changed.
	pub fn on_tab_activated(&self, tab: TabId) -> bool {
		let mut state = self.state();
		if state.session.is_some() {
			debug!(target = "clut.engine", %tab, "activation during switch, MRU unchanged");
			return false;
		}
		let changed = if state.mru.contains(tab) {
			state.mru.index_of(tab) != Some(0) && state.mru.move_to_front(tab)
		} else {
			debug!(target = "clut.engine", %tab, "activated tab was not tracked, adding to front");
			state.mru.push_front(tab)
		};
		debug!(target = "clut.engine", %tab, mru = ?state.mru.to_vec(), "manual activation");
		changed
	}

	/// Processes one switch command and performs its step.
	pub async fn on_command(&self, command: SwitchCommand) -> StepOutcome {
		let mode = command.mode();
		let (epoch, step) = {
			let mut state = self.state();
			let len = state.mru.len();
			if len == 0 {
				debug!(target = "clut.engine", %command, "command ignored, MRU is empty");
				return StepOutcome::Ignored;
			}

			match state.session.as_ref().map(|s| s.mode) {
				Some(current) if current == mode => {
					debug!(target = "clut.engine", %mode, "continuing switch");
				}
				Some(current) => {
					debug!(target = "clut.engine", from = %current, to = %mode, "switching mode, previous preview discarded");
					self.end_session(&mut state, false);
					self.start_session(&mut state, mode);
				}
				None => {
					debug!(target = "clut.engine", %mode, "starting switch");
					self.start_session(&mut state, mode);
				}
			}

			let Some(session) = state.session.as_mut() else {
				return StepOutcome::Superseded;
			};
			session.cursor = clamp_cursor(mode.advance(session.cursor, len), len);
			session.step += 1;
			let ticket = (session.epoch, session.step);
			self.rearm(&mut state);
			ticket
		};

		let outcome = self.step(epoch, step).await;
		debug!(target = "clut.engine", %mode, ?outcome, "step finished");
		outcome
	}

	/// Handles a fired deadline. Returns the tab moved to the front, if any.
	///
	/// Tickets that are no longer current are ignored.
	pub fn on_deadline(&self, ticket: DeadlineTicket) -> Option<TabId> {
		let mut state = self.state();
		match state.session.as_mut() {
			Some(session) if session.deadline == Some(ticket) => {
				session.deadline = None;
			}
			_ => {
				debug!(target = "clut.engine", %ticket, "stale deadline ignored");
				return None;
			}
		}
		self.end_session(&mut state, true)
	}

	fn start_session(&self, state: &mut State, mode: SwitchMode) {
		let epoch = state.next_epoch;
		state.next_epoch += 1;
		state.session = Some(Session::new(mode, epoch));
	}

	/// Ends the active session. With `commit`, the last good step's tab moves to the front.
	fn end_session(&self, state: &mut State, commit: bool) -> Option<TabId> {
		let session = state.session.take()?;
		if let Some(ticket) = session.deadline {
			self.inner.host.disarm_deadline(ticket);
		}
		if !commit {
			debug!(target = "clut.engine", mode = %session.mode, "switch ended without commit");
			return None;
		}
		let tab = state.mru.at(session.committed)?;
		state.mru.move_to_front(tab);
		info!(target = "clut.engine", mode = %session.mode, %tab, index = session.committed, "switch committed");
		debug!(target = "clut.engine", mru = ?state.mru.to_vec());
		Some(tab)
	}

	/// Replaces the session's deadline with a fresh one.
	fn rearm(&self, state: &mut State) {
		let ticket = DeadlineTicket(state.next_ticket);
		state.next_ticket += 1;
		let Some(session) = state.session.as_mut() else {
			return;
		};
		if let Some(previous) = session.deadline.replace(ticket) {
			self.inner.host.disarm_deadline(previous);
		}
		let after = self.inner.config.borrow().timeout_for(session.mode);
		self.inner.host.arm_deadline(ticket, after);
	}

	/// Activates the tab under the cursor of session `epoch`, pruning stale tabs on the way.
	///
	/// `step` is the session's step counter when the command arrived; once a
	/// newer command bumps it, this step stops and leaves the session alone.
	async fn step(&self, epoch: u64, step: u64) -> StepOutcome {
		let mut retries_left = self.inner.state.borrow().mru.len();

		loop {
			let (tab, cursor) = {
				let mut state = self.state();
				let len = state.mru.len();
				if len == 0 {
					if state.session_mut(epoch).is_some() {
						self.end_session(&mut state, false);
					}
					return StepOutcome::Emptied;
				}
				let Some(session) = state.step_mut(epoch, step) else {
					return StepOutcome::Superseded;
				};
				session.cursor = clamp_cursor(session.cursor, len);
				let cursor = session.cursor;
				match state.mru.at(cursor) {
					Some(tab) => (tab, cursor),
					None => return StepOutcome::Superseded,
				}
			};
			debug!(target = "clut.engine", cursor, %tab, "switching to tab");

			let info = match self.inner.host.tab(tab).await {
				Ok(info) => info,
				Err(HostError::TabNotFound(_)) => {
					let mut state = self.state();
					state.forget(tab);
					debug!(target = "clut.engine", %tab, cursor, "stale tab pruned");
					let len = state.mru.len();
					if state.step_mut(epoch, step).is_none() {
						return StepOutcome::Superseded;
					}
					if len == 0 {
						self.end_session(&mut state, false);
						return StepOutcome::Emptied;
					}
					if retries_left == 0 {
						warn!(target = "clut.engine", "stale tab retry limit reached");
						return StepOutcome::Exhausted;
					}
					retries_left -= 1;
					if let Some(session) = state.step_mut(epoch, step) {
						session.cursor = clamp_cursor(session.cursor, len);
					}
					self.rearm(&mut state);
					continue;
				}
				Err(err) => {
					warn!(target = "clut.engine", %tab, error = %err, "tab lookup failed");
					return StepOutcome::LookupFailed { tab };
				}
			};

			if self.state().step_mut(epoch, step).is_none() {
				return StepOutcome::Superseded;
			}
			if let Err(err) = self.inner.host.focus_window(info.window).await {
				warn!(target = "clut.engine", %tab, error = %err, "window focus failed");
				return StepOutcome::FocusFailed { tab };
			}

			if self.state().step_mut(epoch, step).is_none() {
				return StepOutcome::Superseded;
			}
			if let Err(err) = self.inner.host.activate_tab(tab).await {
				warn!(target = "clut.engine", %tab, error = %err, "tab activation failed, pruning");
				self.state().forget(tab);
				return StepOutcome::ActivationFailed { tab };
			}

			let mut state = self.state();
			let index = state.mru.index_of(tab);
			let Some(session) = state.step_mut(epoch, step) else {
				return StepOutcome::Superseded;
			};
			let Some(index) = index else {
				return StepOutcome::Superseded;
			};
			session.committed = index;
			return StepOutcome::Activated { tab, index };
		}
	}
}

/// Initial order: the active tab of the focused window first, then the rest in host order.
fn seed_order(tabs: &[TabSnapshot]) -> MruList {
	let mut mru = MruList::new();
	for snapshot in tabs {
		if snapshot.active && snapshot.window_focused {
			mru.push_front(snapshot.tab);
		} else {
			mru.push_back(snapshot.tab);
		}
	}
	mru
}
