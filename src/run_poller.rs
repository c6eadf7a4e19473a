use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::backend::ConsoleBackend;
use crate::console::ConsoleEvent;
use crate::error::FetchResult;
use crate::model::{RunState, TriggerAck};
use crate::task::LoopTask;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PollStart {
    Started,
    Attached,
}

/// Status of the backend run job, plus the bounded loop that follows it.
///
/// Each loop gets its own cycle number; reports from an older cycle are ignored.
/// Reaching the tick ceiling ends the loop but keeps the last state as-is.
#[derive(Debug)]
pub struct RunPoller {
    state: RunState,
    message: Option<String>,
    trigger_pending: bool,
    active: bool,
    cycle: u64,
    ticks: u32,
    interval: Duration,
    max_ticks: u32,
    task: LoopTask,
}

impl RunPoller {
    pub fn new(interval: Duration, max_ticks: u32) -> Self {
        Self {
            state: RunState::default(),
            message: None,
            trigger_pending: false,
            active: false,
            cycle: 0,
            ticks: 0,
            interval,
            max_ticks,
            task: LoopTask::default(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.active || self.trigger_pending
    }

    pub fn trigger_pending(&self) -> bool {
        self.trigger_pending
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    pub fn begin_trigger(&mut self) {
        self.trigger_pending = true;
        self.message = None;
    }

    /// Returns true when the backend accepted the run and polling should start.
    pub fn apply_trigger(&mut self, result: FetchResult<TriggerAck>) -> bool {
        self.trigger_pending = false;
        match result {
            Ok(ack) if ack.ok => {
                info!(message = %ack.message, "run triggered");
                self.state = RunState::running();
                self.message = Some(ack.message);
                true
            }
            Ok(ack) => {
                warn!(message = %ack.message, "run trigger rejected");
                self.message = Some(if ack.message.is_empty() {
                    "run was rejected".to_string()
                } else {
                    ack.message
                });
                false
            }
            Err(error) => {
                warn!(%error, "run trigger failed");
                self.message = Some(format!("trigger failed: {error}"));
                false
            }
        }
    }

    pub fn start_polling(
        &mut self,
        backend: Arc<dyn ConsoleBackend>,
        tx: UnboundedSender<ConsoleEvent>,
    ) -> PollStart {
        if self.active && self.task.is_running() {
            debug!(cycle = self.cycle, ticks = self.ticks, "run poll already active");
            return PollStart::Attached;
        }

        self.cycle += 1;
        self.ticks = 0;
        self.active = true;
        let cycle = self.cycle;
        let every = self.interval;
        let max_ticks = self.max_ticks;
        self.task.start(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick = 0;
            while tick < max_ticks {
                ticker.tick().await;
                tick += 1;
                let result = backend.last_run().await;
                let terminal = matches!(&result, Ok(state) if !state.is_running());
                if tx.send(ConsoleEvent::RunPolled { cycle, tick, result }).is_err() {
                    return;
                }
                if terminal {
                    break;
                }
            }
            let _ = tx.send(ConsoleEvent::RunPollFinished { cycle, ticks: tick });
        });
        PollStart::Started
    }

    /// Folds one loop report in. Returns true when it ended the run.
    pub fn apply_poll(&mut self, cycle: u64, tick: u32, result: FetchResult<RunState>) -> bool {
        if cycle != self.cycle || !self.active {
            debug!(cycle, current = self.cycle, "dropping report from an old poll loop");
            return false;
        }
        self.ticks = tick;
        match result {
            Ok(state) => {
                let terminal = !state.is_running();
                self.state = state;
                if terminal {
                    info!(status = self.state.status.label(), tick, "run finished");
                    self.active = false;
                    self.task.stop();
                }
                terminal
            }
            Err(error) => {
                debug!(%error, tick, "run status poll failed");
                self.message = Some(format!("status poll failed: {error}"));
                false
            }
        }
    }

    pub fn apply_finished(&mut self, cycle: u64, ticks: u32) {
        if cycle != self.cycle || !self.active {
            return;
        }
        self.active = false;
        self.ticks = ticks;
        info!(
            ticks,
            status = self.state.status.label(),
            "run poll ceiling reached, keeping last known state"
        );
    }

    /// Folds a one-off status check in. Returns true when it observed the end
    /// of a run this poller believed was still going.
    pub fn apply_check(&mut self, result: FetchResult<RunState>) -> bool {
        match result {
            Ok(state) => {
                let finished = self.state.is_running() && !state.is_running();
                self.state = state;
                if finished && self.active {
                    self.active = false;
                    self.task.stop();
                }
                finished
            }
            Err(error) => {
                self.message = Some(format!("status check failed: {error}"));
                false
            }
        }
    }

    pub fn stop(&mut self) {
        self.task.stop();
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{PollStart, RunPoller};
    use crate::console::ConsoleEvent;
    use crate::error::FetchError;
    use crate::model::{RunState, RunStatus, TriggerAck};
    use crate::testutil::FakeBackend;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn done(exit_code: i32) -> RunState {
        RunState {
            status: RunStatus::Done,
            exit_code: Some(exit_code),
            ..RunState::default()
        }
    }

    /// Applies loop reports until the loop says it is finished.
    async fn drive(poller: &mut RunPoller, rx: &mut UnboundedReceiver<ConsoleEvent>) -> u32 {
        let mut polls = 0;
        loop {
            match rx.recv().await {
                Some(ConsoleEvent::RunPolled { cycle, tick, result }) => {
                    polls += 1;
                    poller.apply_poll(cycle, tick, result);
                }
                Some(ConsoleEvent::RunPollFinished { cycle, ticks }) => {
                    poller.apply_finished(cycle, ticks);
                    return polls;
                }
                Some(_) => {}
                None => return polls,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_run_stops_at_ceiling_and_stays_running() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_run_default(Ok(RunState::running()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = RunPoller::new(Duration::from_secs(2), 30);
        assert!(poller.apply_trigger(Ok(TriggerAck {
            ok: true,
            message: "started".to_string(),
        })));

        let started = tokio::time::Instant::now();
        assert_eq!(poller.start_polling(backend.clone(), tx), PollStart::Started);
        let polls = drive(&mut poller, &mut rx).await;

        assert_eq!(polls, 30);
        assert_eq!(backend.calls_to("last_run"), 30);
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert_eq!(poller.state().status, RunStatus::Running);
        assert!(!poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_stops_early() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_run(Ok(RunState::running()));
        backend.push_run(Err(FetchError::Transport("reset".to_string())));
        backend.push_run(Ok(done(1)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = RunPoller::new(Duration::from_secs(2), 30);
        poller.apply_trigger(Ok(TriggerAck {
            ok: true,
            message: String::new(),
        }));

        poller.start_polling(backend.clone(), tx);
        drive(&mut poller, &mut rx).await;

        assert_eq!(backend.calls_to("last_run"), 3);
        assert_eq!(poller.state().status, RunStatus::Done);
        assert_eq!(poller.state().exit_label(), Some("PROBLEM"));
        assert_eq!(poller.ticks(), 3);
        assert!(!poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_while_active_reattaches() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_run_default(Ok(RunState::running()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = RunPoller::new(Duration::from_secs(2), 5);

        assert_eq!(poller.start_polling(backend.clone(), tx.clone()), PollStart::Started);
        assert_eq!(poller.start_polling(backend.clone(), tx), PollStart::Attached);

        let polls = drive(&mut poller, &mut rx).await;
        assert_eq!(polls, 5);
        assert_eq!(backend.calls_to("last_run"), 5);
    }

    #[test]
    fn rejected_trigger_does_not_start() {
        let mut poller = RunPoller::new(Duration::from_secs(2), 30);
        poller.begin_trigger();
        assert!(poller.is_busy());

        let start = poller.apply_trigger(Ok(TriggerAck {
            ok: false,
            message: "a run is already in progress".to_string(),
        }));
        assert!(!start);
        assert!(!poller.is_busy());
        assert_eq!(poller.state().status, RunStatus::NeverRun);
        assert_eq!(poller.message(), Some("a run is already in progress"));

        assert!(!poller.apply_trigger(Err(FetchError::Transport("refused".to_string()))));
        assert_eq!(poller.message(), Some("trigger failed: request failed: refused"));
    }

    #[test]
    fn manual_check_reports_completion_once() {
        let mut poller = RunPoller::new(Duration::from_secs(2), 30);
        assert!(!poller.apply_check(Ok(RunState::running())));
        assert!(poller.apply_check(Ok(done(0))));
        assert!(!poller.apply_check(Ok(done(0))));
        assert_eq!(poller.state().exit_label(), Some("OK"));
    }
}
