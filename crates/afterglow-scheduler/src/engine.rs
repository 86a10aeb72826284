use std::sync::Arc;
use std::time::Duration;

use afterglow_core::{AfterglowError, TriggerPolicy};
use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    clock::Clock,
    error::Result,
    schedule::{compute_next_fire, NextFire},
    task::Task,
    types::{Outcome, ScheduleSettings, SchedulerState, TriggerReport},
};

/// A wake-up this close to the target counts as on time.
const WAKE_TOLERANCE_SECS: i64 = 1;

/// Loop phases. Each arm of [`SchedulerEngine::run`] returns the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    ComputeNext,
    Sleep(DateTime<FixedOffset>),
    Execute,
    Pause(Duration),
}

/// Read side of the scheduler plus the manual trigger.
///
/// Cheap to clone; every clone observes the same loop state.
#[derive(Clone)]
pub struct SchedulerHandle {
    settings: Arc<ScheduleSettings>,
    task: Arc<dyn Task>,
    clock: Arc<dyn Clock>,
    state: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Snapshot of the loop state; never blocks the writer.
    pub fn state(&self) -> SchedulerState {
        self.state.borrow().clone()
    }

    pub fn next_fire(&self) -> Option<DateTime<FixedOffset>> {
        self.state.borrow().next_fire
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.settings.policy
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Current time in the configured local offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.settings.offset)
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// What the loop would pick if it recomputed right now.
    ///
    /// Useful before the loop has published its first target.
    pub fn preview_next_fire(&self) -> Result<NextFire> {
        let s = &self.settings;
        compute_next_fire(&s.policy, &s.location, s.offset, self.clock.now())
    }

    /// Watch the loop state change.
    #[cfg(any(test, feature = "testing-support"))]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Run the task immediately on the caller's task.
    ///
    /// Independent of the loop: it does not wait for, block, or reset the
    /// scheduled fire, and its outcome is not written to [`SchedulerState`].
    pub async fn trigger_now(&self) -> std::result::Result<TriggerReport, AfterglowError> {
        let started_at = self.now();
        info!(task = %self.task.name(), "manual trigger");
        match self.task.run().await {
            Ok(summary) => {
                info!(task = %self.task.name(), %summary, "manual trigger succeeded");
                Ok(TriggerReport {
                    summary,
                    started_at,
                    finished_at: self.now(),
                })
            }
            Err(e) => {
                warn!(task = %self.task.name(), code = e.code(), "manual trigger failed: {e}");
                Err(e)
            }
        }
    }
}

/// Drives the daily fire loop until shutdown or a configuration error.
pub struct SchedulerEngine {
    settings: Arc<ScheduleSettings>,
    task: Arc<dyn Task>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SchedulerState>,
}

impl SchedulerEngine {
    /// Create the engine and the handle that observes it.
    pub fn new(
        settings: ScheduleSettings,
        task: Arc<dyn Task>,
        clock: Arc<dyn Clock>,
    ) -> (Self, SchedulerHandle) {
        let settings = Arc::new(settings);
        let (tx, rx) = watch::channel(SchedulerState::default());
        let handle = SchedulerHandle {
            settings: Arc::clone(&settings),
            task: Arc::clone(&task),
            clock: Arc::clone(&clock),
            state: rx,
        };
        let engine = Self {
            settings,
            task,
            clock,
            state: tx,
        };
        (engine, handle)
    }

    /// Main loop. Returns `Ok` when `shutdown` broadcasts `true` (or its
    /// sender is dropped) and `Err` when the policy can no longer produce a
    /// future fire time. Task failures never end the loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            policy = %self.settings.policy,
            location = %self.settings.location,
            offset = %self.settings.offset,
            "scheduler engine started"
        );

        let mut phase = Phase::ComputeNext;
        loop {
            if *shutdown.borrow() {
                break;
            }

            phase = match phase {
                Phase::ComputeNext => match self.compute_next() {
                    Ok(target) => Phase::Sleep(target),
                    Err(e) => {
                        error!("scheduler cannot compute a future fire time: {e}");
                        self.state.send_modify(|s| s.next_fire = None);
                        return Err(e);
                    }
                },

                Phase::Sleep(target) => {
                    let remaining = target.with_timezone(&Utc) - self.clock.now();
                    if remaining <= chrono::TimeDelta::seconds(WAKE_TOLERANCE_SECS) {
                        Phase::Execute
                    } else {
                        let wait = remaining.to_std().unwrap_or(Duration::ZERO);
                        if !wait_or_shutdown(wait, &mut shutdown).await {
                            break;
                        }
                        // Re-check against the clock: a wall-clock jump
                        // backwards means the target is still ahead.
                        Phase::Sleep(target)
                    }
                }

                Phase::Execute => self.execute().await,

                Phase::Pause(duration) => {
                    if !wait_or_shutdown(duration, &mut shutdown).await {
                        break;
                    }
                    Phase::ComputeNext
                }
            };
        }

        info!("scheduler engine shutting down");
        Ok(())
    }

    // --- private helpers ---------------------------------------------------

    fn compute_next(&self) -> Result<DateTime<FixedOffset>> {
        let s = &self.settings;
        let now = self.clock.now();
        let next = compute_next_fire(&s.policy, &s.location, s.offset, now)?;

        let wait = next.at.with_timezone(&Utc) - now;
        match next.sunset {
            Some(sunset) => info!(
                at = %next.at,
                %sunset,
                wait_mins = wait.num_minutes(),
                "next push scheduled before sunset"
            ),
            None => info!(at = %next.at, wait_mins = wait.num_minutes(), "next push scheduled"),
        }

        self.state.send_modify(|st| st.next_fire = Some(next.at));
        Ok(next.at)
    }

    async fn execute(&self) -> Phase {
        let started = self.clock.now().with_timezone(&self.settings.offset);
        info!(task = %self.task.name(), "executing scheduled push");

        let result = self.task.run().await;
        self.state.send_modify(|st| {
            st.runs += 1;
            st.last_run = Some(started);
            match &result {
                Ok(_) => {
                    st.last_outcome = Outcome::Success;
                    st.last_error = None;
                }
                Err(e) => {
                    st.last_outcome = Outcome::Failure;
                    st.last_error = Some(e.to_string());
                }
            }
        });

        match result {
            Ok(summary) => {
                info!(task = %self.task.name(), %summary, "scheduled push succeeded");
                Phase::Pause(self.settings.success_cooldown)
            }
            Err(e) if e.is_recoverable() => {
                warn!(
                    task = %self.task.name(),
                    code = e.code(),
                    backoff_secs = self.settings.failure_backoff.as_secs(),
                    "scheduled push failed: {e}"
                );
                Phase::Pause(self.settings.failure_backoff)
            }
            Err(e) => {
                // Retried anyway: the webhook URL may be fixed through env and a restart.
                error!(
                    task = %self.task.name(),
                    code = e.code(),
                    backoff_secs = self.settings.failure_backoff.as_secs(),
                    "scheduled push failed on configuration, later runs will fail the same way: {e}"
                );
                Phase::Pause(self.settings.failure_backoff)
            }
        }
    }
}

/// Sleep for `duration` unless shutdown is requested first.
///
/// Returns `false` on shutdown. A dropped sender counts as shutdown.
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::error::SchedulerError;
    use afterglow_core::GeoCoordinate;
    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::{mpsc, Barrier};

    fn cst() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn local(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        cst()
            .with_ymd_and_hms(2024, 6, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn settings(policy: TriggerPolicy) -> ScheduleSettings {
        ScheduleSettings {
            policy,
            location: GeoCoordinate::new(31.2304, 121.4737),
            offset: cst(),
            success_cooldown: Duration::from_secs(60),
            failure_backoff: Duration::from_secs(600),
        }
    }

    const HALF_PAST_FIVE: TriggerPolicy = TriggerPolicy::FixedTime {
        hour: 17,
        minute: 30,
    };

    fn assert_close(actual: DateTime<Utc>, expected: DateTime<Utc>) {
        let diff = (actual - expected).num_milliseconds().abs();
        assert!(diff <= 1000, "{actual} is not within 1s of {expected}");
    }

    /// Pops a scripted result per call (`true` = success) and reports when it ran.
    struct Scripted {
        clock: Arc<TokioClock>,
        script: Mutex<VecDeque<bool>>,
        fired: mpsc::UnboundedSender<DateTime<Utc>>,
    }

    #[async_trait]
    impl Task for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn run(&self) -> afterglow_core::Result<String> {
            let _ = self.fired.send(self.clock.now());
            let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok("sent".to_string())
            } else {
                Err(AfterglowError::Send("webhook returned 500".into()))
            }
        }
    }

    fn scripted(
        clock: &Arc<TokioClock>,
        script: &[bool],
    ) -> (Arc<Scripted>, mpsc::UnboundedReceiver<DateTime<Utc>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = Arc::new(Scripted {
            clock: Arc::clone(clock),
            script: Mutex::new(script.iter().copied().collect()),
            fired: tx,
        });
        (task, rx)
    }

    async fn wait_state(
        rx: &mut watch::Receiver<SchedulerState>,
        pred: impl FnMut(&SchedulerState) -> bool,
    ) -> SchedulerState {
        rx.wait_for(pred).await.unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn success_cools_down_then_targets_tomorrow() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 17, 0)));
        let (task, mut fired) = scripted(&clock, &[true]);
        let (engine, handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock.clone());
        let (_stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(engine.run(stop_rx));

        let first = fired.recv().await.unwrap();
        assert_close(first, local(21, 17, 30));

        let tomorrow = cst().with_ymd_and_hms(2024, 6, 22, 17, 30, 0).unwrap();
        let mut rx = handle.subscribe();
        let state = wait_state(&mut rx, |s| s.next_fire == Some(tomorrow)).await;
        assert_eq!(state.runs, 1);
        assert_eq!(state.last_outcome, Outcome::Success);
        assert_eq!(state.last_error, None);
        assert!(clock.now() - first >= TimeDelta::seconds(60));

        let second = fired.recv().await.unwrap();
        assert_close(second, local(22, 17, 30));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_backs_off_and_keeps_looping() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 17, 0)));
        let (task, mut fired) = scripted(&clock, &[false, true]);
        let (engine, handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock.clone());
        let (_stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(engine.run(stop_rx));

        let first = fired.recv().await.unwrap();
        assert_close(first, local(21, 17, 30));

        let tomorrow = cst().with_ymd_and_hms(2024, 6, 22, 17, 30, 0).unwrap();
        let mut rx = handle.subscribe();
        let state = wait_state(&mut rx, |s| s.next_fire == Some(tomorrow)).await;
        assert_eq!(state.last_outcome, Outcome::Failure);
        assert!(state.last_error.as_deref().unwrap().contains("500"));
        assert!(clock.now() - first >= TimeDelta::minutes(10));

        // No same-day retry: the next attempt is tomorrow's slot.
        let second = fired.recv().await.unwrap();
        assert_close(second, local(22, 17, 30));
        let state = wait_state(&mut rx, |s| s.runs == 2).await;
        assert_eq!(state.last_outcome, Outcome::Success);
        assert_eq!(state.last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_sleep() {
        let origin = local(21, 9, 0);
        let clock = Arc::new(TokioClock::starting_at(origin));
        let (task, mut fired) = scripted(&clock, &[]);
        let (engine, handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock.clone());
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(engine.run(stop_rx));

        let mut rx = handle.subscribe();
        wait_state(&mut rx, |s| s.next_fire.is_some()).await;
        stop_tx.send(true).unwrap();

        join.await.unwrap().unwrap();
        assert!(fired.try_recv().is_err());
        assert!(clock.now() - origin < TimeDelta::minutes(1));
        assert_eq!(handle.state().runs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_shutdown_sender_stops_the_loop() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 9, 0)));
        let (task, _fired) = scripted(&clock, &[]);
        let (engine, _handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock);
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(engine.run(stop_rx));
        drop(stop_tx);
        assert!(join.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_policy_stops_with_an_error() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 12, 0)));
        let (task, mut fired) = scripted(&clock, &[]);
        let policy = TriggerPolicy::SolarRelative {
            lead_minutes: 4 * 24 * 60,
        };
        let (engine, handle) = SchedulerEngine::new(settings(policy), task, clock);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let err = engine.run(stop_rx).await.unwrap_err();
        assert!(matches!(err, SchedulerError::NoFutureTarget { .. }));
        assert_eq!(handle.next_fire(), None);
        assert!(fired.try_recv().is_err());
    }

    /// Both callers meet at the barrier; the first to enter fails.
    struct Gated {
        calls: AtomicU32,
        barrier: Barrier,
        entered: mpsc::UnboundedSender<u32>,
    }

    #[async_trait]
    impl Task for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        async fn run(&self) -> afterglow_core::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.entered.send(n);
            self.barrier.wait().await;
            if n == 0 {
                Err(AfterglowError::UpstreamFetch("timed out".into()))
            } else {
                Ok(format!("call {n}"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn manual_trigger_runs_alongside_the_loop() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 17, 29)));
        let (tx, mut entered) = mpsc::unbounded_channel();
        let task = Arc::new(Gated {
            calls: AtomicU32::new(0),
            barrier: Barrier::new(2),
            entered: tx,
        });
        let (engine, handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock);
        let (_stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(engine.run(stop_rx));

        // The loop is parked inside the task when the manual call arrives.
        assert_eq!(entered.recv().await, Some(0));
        let report = handle.trigger_now().await.unwrap();
        assert_eq!(report.summary, "call 1");
        assert!(report.finished_at >= report.started_at);

        let today = cst().with_ymd_and_hms(2024, 6, 21, 17, 30, 0).unwrap();
        let mut rx = handle.subscribe();
        let state = wait_state(&mut rx, |s| s.runs == 1).await;
        assert_eq!(state.last_outcome, Outcome::Failure);
        assert_eq!(state.next_fire, Some(today));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_trigger_leaves_state_alone() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 9, 0)));
        let (task, mut fired) = scripted(&clock, &[false]);
        let (_engine, handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock);

        let err = handle.trigger_now().await.unwrap_err();
        assert_eq!(err.code(), "SEND_ERROR");
        assert!(fired.recv().await.is_some());
        assert_eq!(handle.state(), SchedulerState::default());

        let report = handle.trigger_now().await.unwrap();
        assert_eq!(report.summary, "sent");
        assert_eq!(handle.state().runs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_local_time_and_preview() {
        let clock = Arc::new(TokioClock::starting_at(local(21, 9, 0)));
        let (task, _fired) = scripted(&clock, &[]);
        let (_engine, handle) = SchedulerEngine::new(settings(HALF_PAST_FIVE), task, clock);

        assert_eq!(handle.now().offset().local_minus_utc(), 8 * 3600);
        assert_eq!(handle.policy(), HALF_PAST_FIVE);
        let preview = handle.preview_next_fire().unwrap();
        assert_eq!(
            preview.at,
            cst().with_ymd_and_hms(2024, 6, 21, 17, 30, 0).unwrap()
        );
        assert_eq!(handle.next_fire(), None);
    }
}
