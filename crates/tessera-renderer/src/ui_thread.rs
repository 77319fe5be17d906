//! The single thread on which native objects are mutated.
//!
//! Callers on any thread hand a closure to [`UiThread::run_and_wait`] and
//! block until it has run. Jobs execute strictly in submission order, so
//! two mutations never interleave.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UiThreadError {
    #[error("UI thread has stopped")]
    Stopped,

    #[error("UI job panicked: {0}")]
    Panicked(String),
}

pub struct UiThread {
    tx: Option<mpsc::Sender<Job>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl UiThread {
    /// Start the UI thread.
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
            debug!("UI thread job queue closed");
        })?;
        Ok(Self {
            tx: Some(tx),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Run `f` on the UI thread and block until it returns.
    ///
    /// Runs inline when called from the UI thread itself, since queueing
    /// would deadlock. A panicking job is contained; the thread keeps
    /// serving later jobs.
    pub fn run_and_wait<R, F>(&self, f: F) -> Result<R, UiThreadError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return catch_unwind(AssertUnwindSafe(f)).map_err(|p| panic_message(&*p));
        }

        let tx = self.tx.as_ref().ok_or(UiThreadError::Stopped)?;
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(f)).map_err(|p| panic_message(&*p));
            if let Err(ref e) = result {
                error!(error = %e, "UI job failed");
            }
            let _ = done_tx.send(result);
        });
        tx.send(job).map_err(|_| UiThreadError::Stopped)?;
        done_rx.recv().map_err(|_| UiThreadError::Stopped)?
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> UiThreadError {
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    UiThreadError::Panicked(msg)
}

impl Drop for UiThread {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if !self.is_current() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn jobs_run_on_the_ui_thread() {
        let ui = UiThread::spawn("tessera-ui-test").unwrap();
        let name = ui
            .run_and_wait(|| thread::current().name().map(str::to_string))
            .unwrap();
        assert_eq!(name.as_deref(), Some("tessera-ui-test"));
        assert!(!ui.is_current());
    }

    #[test]
    fn jobs_from_many_threads_are_serialized() {
        let ui = Arc::new(UiThread::spawn("tessera-ui-test").unwrap());
        let log = Arc::new(Mutex::new(Vec::new()));
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let ui = Arc::clone(&ui);
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    ui.run_and_wait(move || log.lock().unwrap().push(i)).unwrap();
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(log.lock().unwrap().len(), 8);
    }

    #[test]
    fn panicking_job_is_contained() {
        let ui = UiThread::spawn("tessera-ui-test").unwrap();
        let result: Result<(), _> = ui.run_and_wait(|| panic!("boom"));
        assert_eq!(result, Err(UiThreadError::Panicked("boom".into())));
        assert_eq!(ui.run_and_wait(|| 7).unwrap(), 7);
    }
}
