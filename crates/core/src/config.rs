//! Switcher settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::SwitchMode;

/// Default commit delay for fast switching, tuned for rapid repeated presses.
pub const DEFAULT_FAST_TIMEOUT_MS: u64 = 350;
/// Default commit delay for slow switching, long enough to preview a tab.
pub const DEFAULT_SLOW_TIMEOUT_MS: u64 = 1500;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Timing and logging settings.
///
/// Every field is optional in serialized form and falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SwitchConfig {
	pub fast_timeout_ms: u64,
	pub slow_timeout_ms: u64,
	/// `tracing` level name (`error`, `warn`, `info`, `debug`, `trace`).
	pub log_level: String,
}

impl Default for SwitchConfig {
	fn default() -> Self {
		Self {
			fast_timeout_ms: DEFAULT_FAST_TIMEOUT_MS,
			slow_timeout_ms: DEFAULT_SLOW_TIMEOUT_MS,
			log_level: DEFAULT_LOG_LEVEL.to_string(),
		}
	}
}

impl SwitchConfig {
	/// Parses and validates a JSON config object.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: SwitchConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects zero timeouts, which would commit before the step finishes.
	pub fn validate(&self) -> Result<()> {
		if self.fast_timeout_ms == 0 {
			return Err(Error::Config("fastTimeoutMs must be greater than zero".into()));
		}
		if self.slow_timeout_ms == 0 {
			return Err(Error::Config("slowTimeoutMs must be greater than zero".into()));
		}
		Ok(())
	}

	/// Commit delay for a session in `mode`.
	pub fn timeout_for(&self, mode: SwitchMode) -> Duration {
		match mode {
			SwitchMode::Fast => Duration::from_millis(self.fast_timeout_ms),
			SwitchMode::SlowForward | SwitchMode::SlowBackward => Duration::from_millis(self.slow_timeout_ms),
		}
	}
}
