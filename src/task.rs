use std::future::Future;
use tokio::task::JoinHandle;

/// A background loop with an explicit start/stop lifecycle.
///
/// Starting an already-running loop replaces it; dropping the handle aborts it.
#[derive(Debug, Default)]
pub struct LoopTask {
    handle: Option<JoinHandle<()>>,
}

impl LoopTask {
    pub fn start<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        self.handle = Some(tokio::spawn(future));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for LoopTask {
    fn drop(&mut self) {
        self.stop();
    }
}
