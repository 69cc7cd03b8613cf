//! Switch session state and cursor arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::host::{DeadlineTicket, TabId};

/// How a session walks the MRU list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwitchMode {
	/// One step per press toward older tabs, short commit delay.
	Fast,
	/// Walks the list in reverse (index 0 wraps to the oldest tab), long commit delay.
	SlowForward,
	/// Walks toward older tabs like [`Fast`](Self::Fast), long commit delay.
	SlowBackward,
}

impl SwitchMode {
	/// Cursor position after one step in a list of `len` entries.
	///
	/// The result is always in `0..len` for a non-empty list when `cursor` was
	/// in bounds. An empty list yields 0.
	pub fn advance(self, cursor: usize, len: usize) -> usize {
		if len == 0 {
			return 0;
		}
		match self {
			SwitchMode::SlowForward => {
				if cursor == 0 {
					len - 1
				} else {
					cursor - 1
				}
			}
			SwitchMode::Fast | SwitchMode::SlowBackward => (cursor + 1) % len,
		}
	}
}

impl fmt::Display for SwitchMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SwitchMode::Fast => "fast",
			SwitchMode::SlowForward => "slow-forward",
			SwitchMode::SlowBackward => "slow-backward",
		})
	}
}

/// Resets a cursor that fell outside `0..len` to 0.
pub fn clamp_cursor(cursor: usize, len: usize) -> usize {
	if cursor < len { cursor } else { 0 }
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchState {
	Idle,
	FastActive,
	SlowForwardActive,
	SlowBackwardActive,
}

impl SwitchState {
	pub fn mode(self) -> Option<SwitchMode> {
		match self {
			SwitchState::Idle => None,
			SwitchState::FastActive => Some(SwitchMode::Fast),
			SwitchState::SlowForwardActive => Some(SwitchMode::SlowForward),
			SwitchState::SlowBackwardActive => Some(SwitchMode::SlowBackward),
		}
	}
}

impl From<Option<SwitchMode>> for SwitchState {
	fn from(mode: Option<SwitchMode>) -> Self {
		match mode {
			None => SwitchState::Idle,
			Some(SwitchMode::Fast) => SwitchState::FastActive,
			Some(SwitchMode::SlowForward) => SwitchState::SlowForwardActive,
			Some(SwitchMode::SlowBackward) => SwitchState::SlowBackwardActive,
		}
	}
}

/// An in-progress cycling interaction.
#[derive(Debug, Clone)]
pub(crate) struct Session {
	pub mode: SwitchMode,
	/// Distinguishes this session from any later one in the same mode.
	pub epoch: u64,
	/// Number of commands taken by this session; only the latest step may record.
	pub step: u64,
	/// Position currently being previewed.
	pub cursor: usize,
	/// Position of the last fully activated tab; committed on expiry.
	pub committed: usize,
	pub deadline: Option<DeadlineTicket>,
}

impl Session {
	pub fn new(mode: SwitchMode, epoch: u64) -> Self {
		Self {
			mode,
			epoch,
			step: 0,
			cursor: 0,
			committed: 0,
			deadline: None,
		}
	}
}

/// What a single switch command ended up doing.
///
/// None of these are user-facing errors; they exist for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
	/// The tab at `index` was focused and activated.
	Activated { tab: TabId, index: usize },
	/// Nothing is tracked, so the command was dropped.
	Ignored,
	/// Looking the tab up failed for a reason other than it being gone.
	LookupFailed { tab: TabId },
	/// The owning window could not be focused; the session stays alive.
	FocusFailed { tab: TabId },
	/// Activation failed; the tab was pruned and the session stays alive.
	ActivationFailed { tab: TabId },
	/// Pruning stale tabs emptied the list and ended the session.
	Emptied,
	/// Stale tabs kept appearing beyond the retry limit.
	Exhausted,
	/// The session ended or was replaced, or a newer command of the same
	/// session arrived, while the step was suspended. Also returned when the
	/// activated tab disappeared before the step could record it.
	Superseded,
}

impl StepOutcome {
	pub fn is_activated(&self) -> bool {
		matches!(self, StepOutcome::Activated { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fast_and_slow_backward_increment_with_wrap() {
		for mode in [SwitchMode::Fast, SwitchMode::SlowBackward] {
			assert_eq!(mode.advance(0, 3), 1);
			assert_eq!(mode.advance(1, 3), 2);
			assert_eq!(mode.advance(2, 3), 0);
		}
	}

	#[test]
	fn slow_forward_decrements_with_wrap() {
		assert_eq!(SwitchMode::SlowForward.advance(0, 3), 2);
		assert_eq!(SwitchMode::SlowForward.advance(2, 3), 1);
		assert_eq!(SwitchMode::SlowForward.advance(1, 3), 0);
	}

	#[test]
	fn single_entry_stays_put() {
		assert_eq!(SwitchMode::Fast.advance(0, 1), 0);
		assert_eq!(SwitchMode::SlowForward.advance(0, 1), 0);
	}

	#[test]
	fn empty_list_advances_to_zero() {
		assert_eq!(SwitchMode::Fast.advance(4, 0), 0);
		assert_eq!(SwitchMode::SlowForward.advance(0, 0), 0);
	}

	#[test]
	fn n_steps_round_trip() {
		for len in 1..8 {
			for mode in [SwitchMode::Fast, SwitchMode::SlowForward, SwitchMode::SlowBackward] {
				let mut cursor = 0;
				for _ in 0..len {
					cursor = mode.advance(cursor, len);
				}
				assert_eq!(cursor, 0, "{mode} with len {len}");
			}
		}
	}

	#[test]
	fn clamp_resets_out_of_bounds() {
		assert_eq!(clamp_cursor(2, 3), 2);
		assert_eq!(clamp_cursor(3, 3), 0);
		assert_eq!(clamp_cursor(0, 0), 0);
	}

	#[test]
	fn state_round_trips_mode() {
		for mode in [SwitchMode::Fast, SwitchMode::SlowForward, SwitchMode::SlowBackward] {
			assert_eq!(SwitchState::from(Some(mode)).mode(), Some(mode));
		}
		assert_eq!(SwitchState::from(None), SwitchState::Idle);
	}
}
