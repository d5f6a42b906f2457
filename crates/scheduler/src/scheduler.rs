use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use spread_bot_core::CycleRunner;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::trigger::TriggerRule;

/// Loop state, mutated only by [`TriggerScheduler::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleState {
    pub next_trigger: DateTime<Utc>,
    pub running: bool,
    /// Cycles started by this scheduler, including failed ones.
    pub cycles_run: u64,
}

/// Stops a running [`TriggerScheduler`] from another task.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    stop_tx: Arc<watch::Sender<bool>>,
}

impl SchedulerHandle {
    /// Asks the loop to exit. A cycle in progress finishes first.
    /// Calling it more than once has no further effect.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

/// Polls the wall clock and runs one cycle per trigger.
pub struct TriggerScheduler {
    rule: TriggerRule,
    runner: Arc<dyn CycleRunner>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    run_on_start: bool,
    state: ScheduleState,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl TriggerScheduler {
    /// # Errors
    /// Returns an error if the first trigger cannot be computed.
    pub fn new(
        rule: TriggerRule,
        runner: Arc<dyn CycleRunner>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let next_trigger = rule.next_after(clock.now())?;
        Ok(Self {
            rule,
            runner,
            clock,
            poll_interval,
            run_on_start: false,
            state: ScheduleState {
                next_trigger,
                running: false,
                cycles_run: 0,
            },
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        })
    }

    /// Run one cycle as soon as the loop starts, before the first trigger.
    #[must_use]
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            stop_tx: Arc::clone(&self.stop_tx),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Runs until [`SchedulerHandle::stop`] is called.
    ///
    /// Wakes every poll interval (or at the trigger, whichever is sooner),
    /// fires the cycle once the trigger is reached, then schedules the next
    /// occurrence strictly after the one that fired. Cycle errors and panics
    /// are logged and never end the loop. A trigger that cannot be computed
    /// is logged and ends it.
    pub async fn run(&mut self) {
        self.state.running = true;
        if !self.schedule_next(self.clock.now()) {
            self.state.running = false;
            return;
        }
        info!(
            next_trigger = %self.state.next_trigger,
            execution_day = %self.rule.day,
            timezone = %self.rule.timezone,
            poll_secs = self.poll_interval.as_secs(),
            "Scheduler started"
        );

        if self.run_on_start && !self.stop_requested() {
            info!("Running cycle on start");
            self.fire().await;
        }

        while !self.stop_requested() {
            let now = self.clock.now();
            if now >= self.state.next_trigger {
                let fired = self.state.next_trigger;
                info!(trigger = %fired, "Trigger reached");
                self.fire().await;

                let after = self.clock.now().max(fired + chrono::Duration::seconds(1));
                if !self.schedule_next(after) {
                    break;
                }
                info!(next_trigger = %self.state.next_trigger, "Next trigger scheduled");
                continue;
            }

            let until_trigger = (self.state.next_trigger - now).to_std().unwrap_or(Duration::ZERO);
            let wait = self.poll_interval.min(until_trigger);
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                _ = self.stop_rx.changed() => {}
            }
        }

        self.state.running = false;
        info!(cycles_run = self.state.cycles_run, "Scheduler stopped");
    }

    fn schedule_next(&mut self, after: DateTime<Utc>) -> bool {
        match self.rule.next_after(after) {
            Ok(next) => {
                self.state.next_trigger = next;
                true
            }
            Err(e) => {
                error!(error = %e, "Cannot compute next trigger, stopping scheduler");
                false
            }
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    async fn fire(&mut self) {
        self.state.cycles_run += 1;
        let runner = Arc::clone(&self.runner);
        match tokio::spawn(async move { runner.execute_cycle().await }).await {
            Ok(Ok(summary)) => info!(
                status = %summary.status,
                total_symbols = summary.total_symbols,
                success_count = summary.success_count,
                failure_count = summary.failure_count,
                "Scheduled cycle finished"
            ),
            Ok(Err(e)) => error!(error = %e, "Scheduled cycle failed"),
            Err(e) if e.is_panic() => error!(error = %e, "Scheduled cycle panicked"),
            Err(e) => warn!(error = %e, "Scheduled cycle was cancelled"),
        }
    }
}
