mod common;

use std::time::Duration;

use clut::testing::FakeHost;
use clut::{Engine, StepOutcome, SwitchCommand, SwitchConfig, SwitchState, TabId};
use common::{expire, ids, init_tracing, seeded, seeded_with};

#[tokio::test]
async fn fast_switch_previews_then_commits_on_expiry() {
	let engine = seeded(&[1, 2, 3]).await;

	let outcome = engine.on_command(SwitchCommand::Fast).await;
	assert_eq!(outcome, StepOutcome::Activated { tab: TabId(2), index: 1 });
	assert_eq!(engine.committed_cursor(), Some(1));
	assert_eq!(engine.switch_state(), SwitchState::FastActive);
	assert_eq!(engine.mru(), ids(&[1, 2, 3]));
	assert_eq!(engine.host().active_tab(), Some(TabId(2)));

	assert_eq!(expire(&engine), Some(TabId(2)));
	assert_eq!(engine.mru(), ids(&[2, 1, 3]));
	assert_eq!(engine.switch_state(), SwitchState::Idle);
	assert_eq!(engine.cursor(), None);
}

#[tokio::test]
async fn repeated_commands_reorder_only_on_expiry() {
	let engine = seeded(&[1, 2, 3, 4]).await;

	for expected in [2, 3, 4] {
		let outcome = engine.on_command(SwitchCommand::Fast).await;
		assert!(matches!(outcome, StepOutcome::Activated { tab, .. } if tab == TabId(expected)));
		assert_eq!(engine.mru(), ids(&[1, 2, 3, 4]));
	}

	assert_eq!(expire(&engine), Some(TabId(4)));
	assert_eq!(engine.mru(), ids(&[4, 1, 2, 3]));
}

#[tokio::test]
async fn full_cycle_returns_to_starting_tab() {
	let engine = seeded(&[1, 2, 3]).await;

	for _ in 0..3 {
		engine.on_command(SwitchCommand::Fast).await;
	}
	assert_eq!(engine.host().activated(), ids(&[2, 3, 1]));
	assert_eq!(engine.cursor(), Some(0));

	assert_eq!(expire(&engine), Some(TabId(1)));
	assert_eq!(engine.mru(), ids(&[1, 2, 3]));
}

#[tokio::test]
async fn slow_forward_walks_from_the_oldest_tab() {
	let engine = seeded(&[1, 2, 3, 4]).await;

	for _ in 0..3 {
		engine.on_command(SwitchCommand::SlowForward).await;
	}
	assert_eq!(engine.host().activated(), ids(&[4, 3, 2]));
	assert_eq!(engine.switch_state(), SwitchState::SlowForwardActive);

	assert_eq!(expire(&engine), Some(TabId(2)));
	assert_eq!(engine.mru(), ids(&[2, 1, 3, 4]));
}

#[tokio::test]
async fn slow_backward_walks_like_fast() {
	let engine = seeded(&[1, 2, 3]).await;

	engine.on_command(SwitchCommand::SlowBackward).await;
	engine.on_command(SwitchCommand::SlowBackward).await;
	assert_eq!(engine.host().activated(), ids(&[2, 3]));

	assert_eq!(expire(&engine), Some(TabId(3)));
	assert_eq!(engine.mru(), ids(&[3, 1, 2]));
}

#[tokio::test]
async fn mode_switch_discards_the_previous_preview() {
	let engine = seeded(&[1, 2, 3]).await;

	let first = engine.on_command(SwitchCommand::SlowForward).await;
	assert_eq!(first, StepOutcome::Activated { tab: TabId(3), index: 2 });
	let abandoned = engine.pending_deadline().unwrap();

	let second = engine.on_command(SwitchCommand::SlowBackward).await;
	assert_eq!(second, StepOutcome::Activated { tab: TabId(2), index: 1 });
	assert_eq!(engine.switch_state(), SwitchState::SlowBackwardActive);
	assert_eq!(engine.mru(), ids(&[1, 2, 3]));
	assert!(engine.host().disarmed_deadlines().contains(&abandoned));

	// The replaced session's timer is dead even if the host delivers it late.
	assert_eq!(engine.on_deadline(abandoned), None);
	assert_eq!(engine.mru(), ids(&[1, 2, 3]));

	assert_eq!(expire(&engine), Some(TabId(2)));
	assert_eq!(engine.mru(), ids(&[2, 1, 3]));
}

#[tokio::test]
async fn many_previews_then_mode_switch_never_reorders() {
	let engine = seeded(&[1, 2, 3, 4]).await;

	for _ in 0..5 {
		engine.on_command(SwitchCommand::Fast).await;
	}
	engine.on_command(SwitchCommand::SlowForward).await;
	assert_eq!(engine.mru(), ids(&[1, 2, 3, 4]));
	assert_eq!(engine.committed_cursor(), Some(3));

	engine.on_command(SwitchCommand::Fast).await;
	assert_eq!(engine.mru(), ids(&[1, 2, 3, 4]));
	assert_eq!(engine.committed_cursor(), Some(1));
}

#[tokio::test]
async fn empty_mru_ignores_commands() {
	init_tracing();
	let engine = Engine::new(FakeHost::new(), SwitchConfig::default());
	assert_eq!(engine.initialize().await.unwrap(), 0);

	for command in SwitchCommand::ALL {
		assert_eq!(engine.on_command(command).await, StepOutcome::Ignored);
	}
	assert_eq!(engine.switch_state(), SwitchState::Idle);
	assert!(engine.host().armed_deadlines().is_empty());
}

#[tokio::test]
async fn single_tab_reactivates_itself() {
	let engine = seeded(&[7]).await;

	assert_eq!(engine.on_command(SwitchCommand::Fast).await, StepOutcome::Activated { tab: TabId(7), index: 0 });
	assert_eq!(engine.on_command(SwitchCommand::SlowForward).await, StepOutcome::Activated { tab: TabId(7), index: 0 });
	assert_eq!(expire(&engine), Some(TabId(7)));
	assert_eq!(engine.mru(), ids(&[7]));
}

#[tokio::test]
async fn deadline_length_follows_mode() {
	let config = SwitchConfig {
		fast_timeout_ms: 200,
		slow_timeout_ms: 2000,
		..SwitchConfig::default()
	};
	let engine = seeded_with(&[1, 2, 3], config).await;

	engine.on_command(SwitchCommand::Fast).await;
	engine.on_command(SwitchCommand::SlowBackward).await;

	let delays: Vec<Duration> = engine.host().armed_deadlines().into_iter().map(|(_, d)| d).collect();
	assert_eq!(delays, vec![Duration::from_millis(200), Duration::from_millis(2000)]);
}

#[tokio::test]
async fn each_command_replaces_the_deadline() {
	let engine = seeded(&[1, 2, 3]).await;

	engine.on_command(SwitchCommand::Fast).await;
	let first = engine.pending_deadline().unwrap();
	engine.on_command(SwitchCommand::Fast).await;
	let second = engine.pending_deadline().unwrap();

	assert_ne!(first, second);
	assert_eq!(engine.host().disarmed_deadlines(), vec![first]);
	assert_eq!(engine.host().live_deadline(), Some(second));

	// A stale timer firing late must not end the session.
	assert_eq!(engine.on_deadline(first), None);
	assert!(engine.is_switching());
	assert_eq!(engine.mru(), ids(&[1, 2, 3]));
}

#[tokio::test]
async fn manual_activation_during_switch_is_ignored() {
	let engine = seeded(&[1, 2, 3]).await;

	engine.on_command(SwitchCommand::Fast).await;
	assert!(!engine.on_tab_activated(TabId(2)));
	assert!(!engine.on_tab_activated(TabId(3)));
	assert_eq!(engine.mru(), ids(&[1, 2, 3]));

	expire(&engine);
	assert!(engine.on_tab_activated(TabId(3)));
	assert_eq!(engine.mru(), ids(&[3, 2, 1]));
}

#[tokio::test]
async fn commit_focuses_the_owning_window() -> anyhow::Result<()> {
	init_tracing();
	let host = FakeHost::new();
	host.add_tab(1, 10);
	host.add_tab(2, 20);
	host.focus_tab(1);
	let engine = Engine::new(host, SwitchConfig::default());
	engine.initialize().await?;

	engine.on_command(SwitchCommand::Fast).await;
	assert_eq!(engine.host().focused_window(), Some(clut::WindowId(20)));
	assert_eq!(expire(&engine), Some(TabId(2)));
	Ok(())
}
