//! CLUT: cycle last used tabs.
//!
//! Platform-independent core of the tab switcher:
//!
//! - **MRU list** ([`MruList`]): duplicate-free tab order, most recent first
//! - **Engine** ([`Engine`]): owns the list and the switch session state machine
//! - **Host contract** ([`Host`]): the async browser services the engine drives
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ extension/background │  chrome.* bindings, event wiring, timers
//! └──────────┬───────────┘
//!            │ implements Host, feeds events
//! ┌──────────▼───────────┐
//! │        Engine        │  sessions, cursor, commit on deadline
//! │  ┌────────────────┐  │
//! │  │    MruList     │  │
//! │  └────────────────┘  │
//! └──────────────────────┘
//! ```
//!
//! A session starts on the first switch command, advances on each command of
//! the same mode, is discarded when a command of another mode arrives, and
//! commits its last activated tab to the front of the list when its deadline
//! fires.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod mru;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::SwitchCommand;
pub use config::SwitchConfig;
pub use engine::Engine;
pub use error::{Error, HostError, Result};
pub use host::{DeadlineTicket, Host, TabId, TabInfo, TabSnapshot, WindowId};
pub use mru::MruList;
pub use session::{StepOutcome, SwitchMode, SwitchState};
