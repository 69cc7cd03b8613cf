//! Contract between the engine and the browser it runs in.
//!
//! The engine never talks to `chrome.*` directly. Everything it needs from the
//! browser goes through [`Host`], which keeps the state machine testable with
//! an in-memory double (`testing::FakeHost`, behind the `testing` feature).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Opaque tab handle assigned by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i32);

impl fmt::Display for TabId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i32> for TabId {
	fn from(id: i32) -> Self {
		Self(id)
	}
}

/// Opaque window handle assigned by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i32);

impl fmt::Display for WindowId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i32> for WindowId {
	fn from(id: i32) -> Self {
		Self(id)
	}
}

/// One open tab as seen during startup enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
	pub tab: TabId,
	pub window: WindowId,
	/// Active tab of its window.
	pub active: bool,
	/// Owning window has focus.
	pub window_focused: bool,
}

/// Live tab details returned by [`Host::tab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
	pub id: TabId,
	pub window: WindowId,
}

/// Identifies one armed deadline.
///
/// Tickets are never reused within an engine, so a timer that fires after it
/// was replaced can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeadlineTicket(pub u64);

impl fmt::Display for DeadlineTicket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Browser services consumed by [`Engine`](crate::Engine).
///
/// Async methods may suspend; other events can be delivered to the engine
/// while they are pending. Futures are not `Send` because the engine runs on
/// a single thread (a service worker in production).
#[async_trait(?Send)]
pub trait Host {
	/// Lists every open tab across all windows in host order.
	async fn enumerate(&self) -> Result<Vec<TabSnapshot>, HostError>;

	/// Looks up a tab. Must return [`HostError::TabNotFound`] when the tab is gone.
	async fn tab(&self, id: TabId) -> Result<TabInfo, HostError>;

	/// Brings a window to the foreground.
	async fn focus_window(&self, window: WindowId) -> Result<(), HostError>;

	/// Makes a tab the active, highlighted tab of its window.
	async fn activate_tab(&self, id: TabId) -> Result<(), HostError>;

	/// Schedules [`Engine::on_deadline`](crate::Engine::on_deadline) with `ticket` after `after`.
	fn arm_deadline(&self, ticket: DeadlineTicket, after: Duration);

	/// Cancels a previously armed deadline. Unknown tickets are ignored.
	fn disarm_deadline(&self, ticket: DeadlineTicket);
}
