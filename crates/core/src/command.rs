//! Keyboard commands understood by the switcher.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::session::SwitchMode;

/// A switch command as named in the extension manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchCommand {
	#[serde(rename = "alt_switch_fast")]
	Fast,
	#[serde(rename = "alt_switch_slow_forward")]
	SlowForward,
	#[serde(rename = "alt_switch_slow_backward")]
	SlowBackward,
}

impl SwitchCommand {
	pub const ALL: [SwitchCommand; 3] = [SwitchCommand::Fast, SwitchCommand::SlowForward, SwitchCommand::SlowBackward];

	/// Manifest command name.
	pub fn name(self) -> &'static str {
		match self {
			SwitchCommand::Fast => "alt_switch_fast",
			SwitchCommand::SlowForward => "alt_switch_slow_forward",
			SwitchCommand::SlowBackward => "alt_switch_slow_backward",
		}
	}

	/// Session mode this command starts or continues.
	pub fn mode(self) -> SwitchMode {
		match self {
			SwitchCommand::Fast => SwitchMode::Fast,
			SwitchCommand::SlowForward => SwitchMode::SlowForward,
			SwitchCommand::SlowBackward => SwitchMode::SlowBackward,
		}
	}
}

impl fmt::Display for SwitchCommand {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for SwitchCommand {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		SwitchCommand::ALL
			.into_iter()
			.find(|c| c.name() == s)
			.ok_or_else(|| Error::UnknownCommand(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_manifest_names() {
		for command in SwitchCommand::ALL {
			assert_eq!(command.name().parse::<SwitchCommand>().unwrap(), command);
		}
	}

	#[test]
	fn rejects_unknown_names() {
		let err = "alt_switch_sideways".parse::<SwitchCommand>().unwrap_err();
		assert!(matches!(err, Error::UnknownCommand(name) if name == "alt_switch_sideways"));
	}

	#[test]
	fn serde_uses_manifest_names() {
		let json = serde_json::to_string(&SwitchCommand::SlowForward).unwrap();
		assert_eq!(json, "\"alt_switch_slow_forward\"");
		let parsed: SwitchCommand = serde_json::from_str("\"alt_switch_slow_backward\"").unwrap();
		assert_eq!(parsed, SwitchCommand::SlowBackward);
	}

	#[test]
	fn maps_to_modes() {
		assert_eq!(SwitchCommand::Fast.mode(), SwitchMode::Fast);
		assert_eq!(SwitchCommand::SlowForward.mode(), SwitchMode::SlowForward);
		assert_eq!(SwitchCommand::SlowBackward.mode(), SwitchMode::SlowBackward);
	}
}
