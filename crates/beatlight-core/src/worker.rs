//! Background loop threads with cooperative cancellation
//!
//! A worker runs until its `alive` flag is cleared. Shutdown waits a
//! bounded time for the loop to notice; a worker stuck in blocking I/O is
//! detached instead of hanging the caller.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// How a shutdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Joined,
    Panicked,
    Detached,
}

pub struct Worker {
    name: String,
    alive: Arc<AtomicBool>,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn `body` on a named thread. The flag is set before the thread starts.
    pub fn spawn<F>(name: impl Into<String>, alive: Arc<AtomicBool>, body: F) -> io::Result<Self>
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        let name = name.into();
        let (done_tx, done) = crossbeam_channel::bounded(1);
        alive.store(true, Ordering::SeqCst);

        let flag = Arc::clone(&alive);
        let thread_name = name.clone();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            info!("{} thread started", thread_name);
            body(&flag);
            info!("{} thread stopped", thread_name);
            let _ = done_tx.send(());
        })?;

        Ok(Self {
            name,
            alive,
            done,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Clear the flag and wait up to `timeout` for the loop to exit.
    pub fn shutdown(mut self, timeout: Duration) -> Shutdown {
        self.alive.store(false, Ordering::SeqCst);

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let Some(handle) = self.handle.take() else {
                    return Shutdown::Joined;
                };
                match handle.join() {
                    Ok(()) => Shutdown::Joined,
                    Err(_) => {
                        error!("{} thread panicked", self.name);
                        Shutdown::Panicked
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "{} thread still blocked after {:?}, detaching",
                    self.name, timeout
                );
                self.handle.take();
                Shutdown::Detached
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_shutdown_joins_cooperative_loop() {
        let alive = Arc::new(AtomicBool::new(false));
        let iterations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&iterations);

        let worker = Worker::spawn("test-loop", Arc::clone(&alive), move |alive| {
            while alive.load(Ordering::SeqCst) {
                counter.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();

        assert!(worker.is_alive());
        thread::sleep(Duration::from_millis(20));
        assert_eq!(worker.shutdown(Duration::from_secs(2)), Shutdown::Joined);
        assert!(!alive.load(Ordering::SeqCst));
        assert!(iterations.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_blocked_worker_is_detached() {
        let (_hold_tx, hold_rx) = crossbeam_channel::bounded::<()>(0);
        let worker = Worker::spawn("blocked", Arc::new(AtomicBool::new(false)), move |_| {
            let _ = hold_rx.recv_timeout(Duration::from_secs(5));
        })
        .unwrap();

        assert_eq!(
            worker.shutdown(Duration::from_millis(20)),
            Shutdown::Detached
        );
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let worker = Worker::spawn("panics", Arc::new(AtomicBool::new(false)), |_| {
            panic!("boom");
        })
        .unwrap();
        assert_eq!(worker.shutdown(Duration::from_secs(2)), Shutdown::Panicked);
    }
}
