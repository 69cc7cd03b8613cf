//! Error types for the tab switcher.

use thiserror::Error;

use crate::host::{TabId, WindowId};

/// Result type alias for switcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`Host`](crate::Host) implementation.
///
/// The engine recovers from all of these locally. They only show up in logs
/// and in [`StepOutcome`](crate::StepOutcome) values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
	/// The host no longer knows the tab (closed, discarded, or never existed).
	#[error("tab {0} not found")]
	TabNotFound(TabId),

	/// Focusing the owning window failed, e.g. it was closed concurrently.
	#[error("failed to focus window {window}: {message}")]
	WindowFocus { window: WindowId, message: String },

	/// Activating a tab that the host still reports as open failed.
	#[error("failed to activate tab {tab}: {message}")]
	TabActivation { tab: TabId, message: String },

	/// Listing windows and tabs failed.
	#[error("failed to enumerate windows: {0}")]
	Enumerate(String),

	/// Any other error raised at the host boundary.
	#[error("host error: {0}")]
	Js(String),
}

impl HostError {
	/// Returns `true` if the error means the tab is gone for good.
	pub fn is_not_found(&self) -> bool {
		matches!(self, HostError::TabNotFound(_))
	}
}

/// Errors surfaced by fallible public operations.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Host(#[from] HostError),

	/// A command name the switcher does not understand.
	#[error("unknown command: {0}")]
	UnknownCommand(String),

	/// Invalid configuration value.
	#[error("invalid config: {0}")]
	Config(String),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
