//! In-memory [`Host`] for exercising the engine without a browser.
//!
//! [`FakeHost`] keeps a scripted set of windows and tabs, records every call
//! the engine makes, and lets a test suspend a lookup or activation half-way
//! through with [`Pause`] so it can deliver other events in the gap.
//!
//! # Example
//!
//! ```ignore
//! use clut::testing::FakeHost;
//!
//! let host = FakeHost::new();
//! host.add_tab(1, 10);
//! host.add_tab(2, 10);
//! host.close_tab(2); // tab 2 is now stale
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::error::HostError;
use crate::host::{DeadlineTicket, Host, TabId, TabInfo, TabSnapshot, WindowId};

/// A host call observed by [`FakeHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
	Enumerate,
	Lookup(TabId),
	FocusWindow(WindowId),
	Activate(TabId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PausePoint {
	Lookup(TabId),
	Activate(TabId),
}

struct PauseSlot {
	entered: oneshot::Sender<()>,
	release: oneshot::Receiver<()>,
}

/// Handle for a suspended host call, returned by [`FakeHost::pause_lookup`]
/// and [`FakeHost::pause_activation`].
pub struct Pause {
	entered: Option<oneshot::Receiver<()>>,
	release: oneshot::Sender<()>,
}

impl Pause {
	/// Waits until the engine is blocked inside the paused call.
	pub async fn entered(&mut self) {
		if let Some(rx) = self.entered.take() {
			let _ = rx.await;
		}
	}

	/// Lets the paused call continue.
	pub fn release(self) {
		let _ = self.release.send(());
	}
}

#[derive(Default)]
struct FakeState {
	/// Open tabs in enumeration order.
	tabs: Vec<TabSnapshot>,
	enumerate_error: Option<String>,
	lookup_errors: HashMap<TabId, String>,
	unfocusable: HashSet<WindowId>,
	unactivatable: HashSet<TabId>,
	pauses: HashMap<PausePoint, PauseSlot>,
	calls: Vec<HostCall>,
	armed: Vec<(DeadlineTicket, Duration)>,
	disarmed: Vec<DeadlineTicket>,
	focused_window: Option<WindowId>,
	activated: Vec<TabId>,
}

/// Scripted single-threaded browser double.
#[derive(Default)]
pub struct FakeHost {
	state: RefCell<FakeState>,
}

impl FakeHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens `tab` in `window` (inactive, unfocused).
	pub fn add_tab(&self, tab: i32, window: i32) {
		self.state.borrow_mut().tabs.push(TabSnapshot {
			tab: TabId(tab),
			window: WindowId(window),
			active: false,
			window_focused: false,
		});
	}

	/// Makes `tab` the active tab of its window and focuses that window.
	pub fn focus_tab(&self, tab: i32) {
		let mut state = self.state.borrow_mut();
		let Some(window) = state.tabs.iter().find(|t| t.tab == TabId(tab)).map(|t| t.window) else {
			return;
		};
		for snapshot in state.tabs.iter_mut() {
			snapshot.window_focused = snapshot.window == window;
			if snapshot.window == window {
				snapshot.active = snapshot.tab == TabId(tab);
			}
		}
		state.focused_window = Some(window);
	}

	/// Closes `tab` on the host side only, leaving any engine reference stale.
	pub fn close_tab(&self, tab: i32) {
		self.state.borrow_mut().tabs.retain(|t| t.tab != TabId(tab));
	}

	pub fn fail_enumeration(&self, message: &str) {
		self.state.borrow_mut().enumerate_error = Some(message.to_string());
	}

	pub fn restore_enumeration(&self) {
		self.state.borrow_mut().enumerate_error = None;
	}

	/// Makes lookups of `tab` fail with an error other than "not found".
	pub fn fail_lookup(&self, tab: i32, message: &str) {
		self.state.borrow_mut().lookup_errors.insert(TabId(tab), message.to_string());
	}

	pub fn fail_focus(&self, window: i32) {
		self.state.borrow_mut().unfocusable.insert(WindowId(window));
	}

	pub fn fail_activation(&self, tab: i32) {
		self.state.borrow_mut().unactivatable.insert(TabId(tab));
	}

	/// Suspends the next lookup of `tab` until the returned [`Pause`] is released.
	pub fn pause_lookup(&self, tab: i32) -> Pause {
		self.pause(PausePoint::Lookup(TabId(tab)))
	}

	/// Suspends the next activation of `tab` until the returned [`Pause`] is released.
	pub fn pause_activation(&self, tab: i32) -> Pause {
		self.pause(PausePoint::Activate(TabId(tab)))
	}

	fn pause(&self, point: PausePoint) -> Pause {
		let (entered_tx, entered_rx) = oneshot::channel();
		let (release_tx, release_rx) = oneshot::channel();
		self.state.borrow_mut().pauses.insert(
			point,
			PauseSlot {
				entered: entered_tx,
				release: release_rx,
			},
		);
		Pause {
			entered: Some(entered_rx),
			release: release_tx,
		}
	}

	async fn wait_if_paused(&self, point: PausePoint) {
		let slot = self.state.borrow_mut().pauses.remove(&point);
		if let Some(slot) = slot {
			let _ = slot.entered.send(());
			let _ = slot.release.await;
		}
	}

	pub fn calls(&self) -> Vec<HostCall> {
		self.state.borrow().calls.clone()
	}

	/// Tabs successfully activated, in order.
	pub fn activated(&self) -> Vec<TabId> {
		self.state.borrow().activated.clone()
	}

	/// The most recently activated tab, if any.
	pub fn active_tab(&self) -> Option<TabId> {
		self.activated().last().copied()
	}

	pub fn focused_window(&self) -> Option<WindowId> {
		self.state.borrow().focused_window
	}

	/// Every deadline armed so far, with its delay.
	pub fn armed_deadlines(&self) -> Vec<(DeadlineTicket, Duration)> {
		self.state.borrow().armed.clone()
	}

	pub fn disarmed_deadlines(&self) -> Vec<DeadlineTicket> {
		self.state.borrow().disarmed.clone()
	}

	/// The newest deadline that has not been disarmed.
	pub fn live_deadline(&self) -> Option<DeadlineTicket> {
		let state = self.state.borrow();
		state
			.armed
			.iter()
			.rev()
			.map(|(ticket, _)| *ticket)
			.find(|ticket| !state.disarmed.contains(ticket))
	}

	fn record(&self, call: HostCall) {
		self.state.borrow_mut().calls.push(call);
	}
}

#[async_trait(?Send)]
impl Host for FakeHost {
	async fn enumerate(&self) -> Result<Vec<TabSnapshot>, HostError> {
		self.record(HostCall::Enumerate);
		let state = self.state.borrow();
		match &state.enumerate_error {
			Some(message) => Err(HostError::Enumerate(message.clone())),
			None => Ok(state.tabs.clone()),
		}
	}

	async fn tab(&self, id: TabId) -> Result<TabInfo, HostError> {
		self.record(HostCall::Lookup(id));
		self.wait_if_paused(PausePoint::Lookup(id)).await;
		let state = self.state.borrow();
		if let Some(message) = state.lookup_errors.get(&id) {
			return Err(HostError::Js(message.clone()));
		}
		state
			.tabs
			.iter()
			.find(|t| t.tab == id)
			.map(|t| TabInfo { id, window: t.window })
			.ok_or(HostError::TabNotFound(id))
	}

	async fn focus_window(&self, window: WindowId) -> Result<(), HostError> {
		self.record(HostCall::FocusWindow(window));
		let mut state = self.state.borrow_mut();
		if state.unfocusable.contains(&window) || !state.tabs.iter().any(|t| t.window == window) {
			return Err(HostError::WindowFocus {
				window,
				message: format!("No window with id: {window}."),
			});
		}
		state.focused_window = Some(window);
		Ok(())
	}

	async fn activate_tab(&self, id: TabId) -> Result<(), HostError> {
		self.record(HostCall::Activate(id));
		self.wait_if_paused(PausePoint::Activate(id)).await;
		let mut state = self.state.borrow_mut();
		if state.unactivatable.contains(&id) || !state.tabs.iter().any(|t| t.tab == id) {
			return Err(HostError::TabActivation {
				tab: id,
				message: format!("No tab with id: {id}."),
			});
		}
		state.activated.push(id);
		Ok(())
	}

	fn arm_deadline(&self, ticket: DeadlineTicket, after: Duration) {
		self.state.borrow_mut().armed.push((ticket, after));
	}

	fn disarm_deadline(&self, ticket: DeadlineTicket) {
		self.state.borrow_mut().disarmed.push(ticket);
	}
}
