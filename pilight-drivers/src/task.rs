//! Cancellable background task
//!
//! Each device runs its animation or cycle on one dedicated worker thread.
//! Cancellation is cooperative: the worker only observes a stop request at
//! its wait points ([`StopToken::wait`]), so a bus session that has started
//! always runs to its stop condition.
//!
//! The stop signal is a channel that never carries a message. Requesting a
//! stop drops the sending half; from then on every wait on the receiving
//! half returns immediately.

use std::convert::Infallible;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};

use crate::error::Error;

/// Worker side of the stop signal
#[derive(Debug)]
pub struct StopToken {
    stop_rx: Receiver<Infallible>,
}

impl StopToken {
    /// Sleep for `duration` unless a stop is requested first
    ///
    /// Returns `true` if the task should stop.
    pub fn wait(&self, duration: Duration) -> bool {
        match self.stop_rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
            Ok(never) => match never {},
        }
    }

    /// Check for a stop request without sleeping
    pub fn is_stopped(&self) -> bool {
        match self.stop_rx.try_recv() {
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
            Ok(never) => match never {},
        }
    }
}

/// Handle to a running worker thread
///
/// Dropping the handle requests a stop and waits for the worker to exit.
#[derive(Debug)]
pub struct BackgroundTask<E> {
    name: &'static str,
    stop_tx: Option<Sender<Infallible>>,
    handle: Option<JoinHandle<Result<(), Error<E>>>>,
}

impl<E> BackgroundTask<E>
where
    E: fmt::Debug + Send + 'static,
{
    /// Start `body` on a new named thread
    pub fn spawn<F>(name: &'static str, body: F) -> Result<Self, Error<E>>
    where
        F: FnOnce(&StopToken) -> Result<(), Error<E>> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let token = StopToken { stop_rx };

        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let result = body(&token);
                if let Err(e) = &result {
                    error!("task {} failed: {}", name, e);
                }
                result
            })
            .map_err(Error::Spawn)?;

        debug!("task {} started", name);
        Ok(Self {
            name,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl<E> BackgroundTask<E> {
    /// Task name, also used as the thread name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the worker to stop at its next wait point
    ///
    /// Idempotent; does not block.
    pub fn request_stop(&mut self) {
        if self.stop_tx.take().is_some() {
            debug!("task {} stop requested", self.name);
        }
    }

    /// Check if the worker has returned
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker to return and hand back its result
    pub fn join(mut self) -> Result<(), Error<E>> {
        self.join_inner()
    }

    /// Request a stop, then wait for the worker to return
    pub fn stop(mut self) -> Result<(), Error<E>> {
        self.request_stop();
        self.join_inner()
    }

    /// Request a stop, wait for the worker, and log its error instead of
    /// returning it
    ///
    /// Used when a new task replaces this one.
    pub fn cancel(mut self) {
        self.request_stop();
        self.join_logged();
    }

    fn join_logged(&mut self) {
        if self.join_inner().is_err() {
            warn!("task {} ended with an error nobody collected", self.name);
        }
    }

    fn join_inner(&mut self) -> Result<(), Error<E>> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let result = handle.join().unwrap_or(Err(Error::TaskPanicked));
        debug!("task {} joined", self.name);
        result
    }
}

impl<E> Drop for BackgroundTask<E> {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.request_stop();
        self.join_logged();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    type Task = BackgroundTask<()>;

    #[test]
    fn test_runs_to_completion() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let task = Task::spawn("count", move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert!(task.join().is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_interrupts_long_wait() {
        let task = Task::spawn("sleeper", |stop| {
            assert!(stop.wait(Duration::from_secs(60)));
            Ok(())
        })
        .unwrap();

        let started = Instant::now();
        assert!(task.stop().is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_stop_is_sticky() {
        let task = Task::spawn("sticky", |stop| {
            while !stop.wait(Duration::from_millis(10)) {}
            // Every later wait point observes the same request
            assert!(stop.wait(Duration::from_secs(60)));
            assert!(stop.is_stopped());
            Ok(())
        })
        .unwrap();

        assert!(task.stop().is_ok());
    }

    #[test]
    fn test_wait_times_out_without_stop() {
        let task = Task::spawn("timeout", |stop| {
            assert!(!stop.is_stopped());
            assert!(!stop.wait(Duration::from_millis(5)));
            Ok(())
        })
        .unwrap();

        assert!(task.join().is_ok());
    }

    #[test]
    fn test_error_is_returned_by_join() {
        let task = Task::spawn("failing", |_| Err(Error::Pin(()))).unwrap();
        assert!(matches!(task.join(), Err(Error::Pin(()))));
    }

    #[test]
    fn test_panic_is_reported() {
        let task = Task::spawn("panicking", |_| panic!("worker panic")).unwrap();
        assert!(matches!(task.join(), Err(Error::TaskPanicked)));
    }

    #[test]
    fn test_is_finished() {
        let task = Task::spawn("quick", |_| Ok(())).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !task.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(task.is_finished());
        assert_eq!(task.name(), "quick");
    }

    #[test]
    fn test_cancel_swallows_error() {
        let task = Task::spawn("failed", |_| Err(Error::Pin(()))).unwrap();
        let started = Instant::now();
        task.cancel();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_drop_stops_worker() {
        let exited = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&exited);

        let task = Task::spawn("dropped", move |stop| {
            while !stop.wait(Duration::from_millis(10)) {}
            flag.store(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        drop(task);
        assert_eq!(exited.load(Ordering::SeqCst), 1);
    }
}
