//! Periodic tick and refresh events for the UI loop.

use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::issue_store::IssueStore;
use crate::timer::TimerSnapshot;

const DEFAULT_TICK_SECS: u64 = 1;
const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub refresh_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(DEFAULT_TICK_SECS),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Elapsed time of every running timer.
    Tick(Vec<TimerSnapshot>),
    /// Time to reload issue details from Jira.
    Refresh,
}

/// Spawns the scheduler loop. It ends once `events` has no receiver.
pub fn spawn_scheduler(
    store: IssueStore,
    config: SchedulerConfig,
    events: mpsc::Sender<SchedulerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let now = Instant::now();
        let mut tick = interval_at(now + config.tick_interval, config.tick_interval);
        let mut refresh = interval_at(now + config.refresh_interval, config.refresh_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let event = tokio::select! {
                biased;
                _ = refresh.tick() => SchedulerEvent::Refresh,
                _ = tick.tick() => SchedulerEvent::Tick(store.running_snapshots()),
            };
            if events.send(event).await.is_err() {
                debug!("Scheduler receiver dropped, stopping");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;
    use crate::issue_store::TimerPolicy;

    #[tokio::test(start_paused = true)]
    async fn emits_ticks_then_refresh() {
        let store = IssueStore::new(system_clock(), TimerPolicy::default());
        store.add("FOO-1").unwrap();
        store.start("FOO-1").unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_scheduler(store, SchedulerConfig::default(), tx);

        let mut ticks = 0;
        loop {
            match rx.recv().await.expect("scheduler running") {
                SchedulerEvent::Tick(snapshots) => {
                    assert_eq!(snapshots.len(), 1);
                    assert_eq!(snapshots[0].issue_key, "FOO-1");
                    ticks += 1;
                }
                SchedulerEvent::Refresh => break,
            }
        }
        assert!((29..=30).contains(&ticks), "ticks before refresh: {ticks}");

        drop(rx);
        handle.await.expect("scheduler stops");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_carry_only_running_timers() {
        let store = IssueStore::new(system_clock(), TimerPolicy::default());
        store.add("FOO-1").unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let config = SchedulerConfig {
            tick_interval: Duration::from_millis(100),
            refresh_interval: Duration::from_secs(3600),
        };
        let handle = spawn_scheduler(store.clone(), config, tx);

        assert_eq!(rx.recv().await, Some(SchedulerEvent::Tick(Vec::new())));
        store.start("FOO-1").unwrap();
        // The loop may already hold the next event computed before the start.
        let mut next = rx.recv().await;
        if next == Some(SchedulerEvent::Tick(Vec::new())) {
            next = rx.recv().await;
        }
        match next {
            Some(SchedulerEvent::Tick(snapshots)) => assert_eq!(snapshots.len(), 1),
            other => panic!("unexpected event {other:?}"),
        }

        drop(rx);
        handle.await.expect("scheduler stops");
    }
}
