#![allow(dead_code)]

use clut::testing::FakeHost;
use clut::{Engine, SwitchConfig, TabId};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

pub fn ids(tabs: &[i32]) -> Vec<TabId> {
	tabs.iter().copied().map(TabId).collect()
}

/// Engine over a single window holding `tabs`, with the first one focused.
pub async fn seeded(tabs: &[i32]) -> Engine<FakeHost> {
	seeded_with(tabs, SwitchConfig::default()).await
}

pub async fn seeded_with(tabs: &[i32], config: SwitchConfig) -> Engine<FakeHost> {
	init_tracing();
	let host = FakeHost::new();
	for &tab in tabs {
		host.add_tab(tab, 1);
	}
	if let Some(&first) = tabs.first() {
		host.focus_tab(first);
	}
	let engine = Engine::new(host, config);
	engine.initialize().await.expect("fake enumeration succeeds");
	assert_eq!(engine.mru(), ids(tabs));
	engine
}

/// Fires the currently armed deadline.
pub fn expire(engine: &Engine<FakeHost>) -> Option<TabId> {
	let ticket = engine.pending_deadline().expect("a deadline is armed");
	assert_eq!(engine.host().live_deadline(), Some(ticket));
	engine.on_deadline(ticket)
}
