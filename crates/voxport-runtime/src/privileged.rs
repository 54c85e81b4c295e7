use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded, select,
};

use crate::error::ExportError;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs handed-off work on the thread that created it.
///
/// Workers reach it through a [`PrivilegedHandle`]; the owning thread has to pump the
/// queue (see [`PrivilegedExecutor::pump_until_closed`]) while workers may be waiting.
pub struct PrivilegedExecutor {
    task_tx: Sender<Task>,
    task_rx: Receiver<Task>,
    thread: ThreadId,
    timeout: Duration,
    poll: Duration,
}

/// Cloneable sender side given to workers.
#[derive(Clone)]
pub struct PrivilegedHandle {
    task_tx: Sender<Task>,
    thread: ThreadId,
    timeout: Duration,
}

impl PrivilegedExecutor {
    pub fn new(queue_depth: usize, timeout: Duration, poll: Duration) -> Self {
        let (task_tx, task_rx) = bounded(queue_depth.max(1));
        Self {
            task_tx,
            task_rx,
            thread: thread::current().id(),
            timeout,
            poll,
        }
    }

    pub fn handle(&self) -> PrivilegedHandle {
        PrivilegedHandle {
            task_tx: self.task_tx.clone(),
            thread: self.thread,
            timeout: self.timeout,
        }
    }

    /// Serves tasks and forwards `results` to `on_result` until every result sender is gone.
    ///
    /// Tasks still queued after that have no waiter left and are dropped.
    pub fn pump_until_closed<R>(&self, results: &Receiver<R>, mut on_result: impl FnMut(R)) {
        let mut served = 0usize;
        loop {
            select! {
                recv(self.task_rx) -> task => {
                    if let Ok(task) = task {
                        task();
                        served += 1;
                    }
                }
                recv(results) -> res => match res {
                    Ok(r) => on_result(r),
                    Err(_) => break,
                },
                default(self.poll) => {
                    log::trace!("privileged executor idle, {} task(s) served so far", served);
                }
            }
        }
        let stale = self.task_rx.try_iter().count();
        if stale > 0 {
            log::debug!("dropped {} privileged task(s) with no waiter", stale);
        }
        log::debug!("privileged executor served {} task(s)", served);
    }
}

impl PrivilegedHandle {
    #[inline]
    pub fn is_privileged_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Runs `f` on the privileged thread and waits for it, bounded by the session timeout.
    ///
    /// Called from the privileged thread itself, `f` runs inline.
    pub fn call<T, F>(&self, f: F) -> Result<T, ExportError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_privileged_thread() {
            return Ok(f());
        }
        let (done_tx, done_rx) = bounded::<Option<T>>(1);
        let task: Task = Box::new(move || {
            let out = panic::catch_unwind(AssertUnwindSafe(f));
            let _ = done_tx.send(out.ok());
        });
        self.task_tx
            .send_timeout(task, self.timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => ExportError::PrivilegedTimeout(self.timeout),
                SendTimeoutError::Disconnected(_) => ExportError::PrivilegedGone,
            })?;
        match done_rx.recv_timeout(self.timeout) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(ExportError::PrivilegedTaskPanicked),
            Err(RecvTimeoutError::Timeout) => Err(ExportError::PrivilegedTimeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(ExportError::PrivilegedGone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn executor(timeout_ms: u64) -> PrivilegedExecutor {
        PrivilegedExecutor::new(4, Duration::from_millis(timeout_ms), Duration::from_millis(5))
    }

    #[test]
    fn inline_on_owner_thread() {
        let exec = executor(100);
        let owner = thread::current().id();
        let ran_on = exec.handle().call(move || thread::current().id()).unwrap();
        assert_eq!(ran_on, owner);
    }

    #[test]
    fn worker_calls_run_on_owner() {
        let exec = executor(5_000);
        let owner = thread::current().id();
        let handle = exec.handle();
        let (res_tx, res_rx) = unbounded();
        let worker = thread::spawn(move || {
            let r = handle.call(|| thread::current().id());
            let _ = res_tx.send(r.map(|id| id == owner).unwrap_or(false));
        });
        let mut seen = Vec::new();
        exec.pump_until_closed(&res_rx, |ok| seen.push(ok));
        worker.join().unwrap();
        assert_eq!(seen, vec![true]);
    }

    #[test]
    fn unserved_call_times_out() {
        let exec = executor(20);
        let handle = exec.handle();
        let r = thread::spawn(move || handle.call(|| 1)).join().unwrap();
        assert!(matches!(r, Err(ExportError::PrivilegedTimeout(_))));
    }

    #[test]
    fn panics_are_reported() {
        let exec = executor(5_000);
        let handle = exec.handle();
        let (res_tx, res_rx) = unbounded();
        thread::spawn(move || {
            let r: Result<(), _> = handle.call(|| panic!("boom"));
            let _ = res_tx.send(matches!(r, Err(ExportError::PrivilegedTaskPanicked)));
        });
        let mut seen = Vec::new();
        exec.pump_until_closed(&res_rx, |ok| seen.push(ok));
        assert_eq!(seen, vec![true]);
    }

    #[test]
    fn dropped_executor_is_gone() {
        let handle = executor(1_000).handle();
        let r = thread::spawn(move || handle.call(|| 1)).join().unwrap();
        assert!(matches!(r, Err(ExportError::PrivilegedGone)));
    }
}
