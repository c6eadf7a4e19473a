use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::backend::ConsoleBackend;
use crate::console::ConsoleEvent;
use crate::error::FetchResult;
use crate::model::SessionState;
use crate::task::LoopTask;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionTransition {
    Activated,
    Deactivated,
}

/// Tracks whether a usable credential exists.
///
/// The epoch advances on every transition; anything issued under an older
/// epoch belongs to a session that no longer exists.
#[derive(Debug)]
pub struct SessionMonitor {
    current: SessionState,
    epoch: u64,
    period: Duration,
    ticker: LoopTask,
}

impl SessionMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            current: SessionState::default(),
            epoch: 0,
            period,
            ticker: LoopTask::default(),
        }
    }

    pub fn current_session(&self) -> SessionState {
        self.current
    }

    pub fn logged_in(&self) -> bool {
        self.current.logged_in
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Folds one status poll into the current state.
    ///
    /// An unreachable status endpoint is "no change": the previous state is
    /// kept and nothing is reported upward.
    pub fn observe(&mut self, result: FetchResult<SessionState>) -> Option<SessionTransition> {
        let next = match result {
            Ok(next) => next,
            Err(error) => {
                debug!(%error, "session status unavailable, keeping previous state");
                return None;
            }
        };

        let was_logged_in = self.current.logged_in;
        self.current = next;
        match (was_logged_in, next.logged_in) {
            (false, true) => {
                self.epoch += 1;
                info!(epoch = self.epoch, "session became active");
                Some(SessionTransition::Activated)
            }
            (true, false) => {
                self.epoch += 1;
                info!(epoch = self.epoch, "session lost");
                Some(SessionTransition::Deactivated)
            }
            _ => None,
        }
    }

    /// Starts the status poll loop; the first poll fires immediately.
    pub fn start(&mut self, backend: Arc<dyn ConsoleBackend>, tx: UnboundedSender<ConsoleEvent>) {
        let period = self.period;
        self.ticker.start(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let result = backend.session_status().await;
                if tx.send(ConsoleEvent::Session(result)).is_err() {
                    break;
                }
            }
        });
    }

    pub fn stop(&mut self) {
        self.ticker.stop();
    }
}
