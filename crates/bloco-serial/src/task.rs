//! Worker tasks with a completion channel
//!
//! Long-running exchanges are pushed onto short-lived worker threads so the
//! owning thread stays responsive. Each worker delivers its single result
//! over a one-shot channel; the owner polls or blocks for it and performs
//! all state mutation itself. Workers never touch shared state, and there is
//! no cancellation: a hung exchange occupies its worker until the read
//! bounds expire.

use std::sync::mpsc;
use std::thread;

/// Handle to one worker's pending result
pub struct Task<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Task<T> {
    /// Non-blocking poll. `Some` exactly once; `None` while the worker is
    /// still running (and forever after a worker panic).
    pub fn try_take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Block until the worker finishes. `None` if the worker panicked.
    pub fn take(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

/// Run a blocking closure on a worker thread and hand back its result
pub fn spawn<T, F>(work: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        // The owner may have dropped the task; a dead channel is fine.
        let _ = tx.send(work());
    });
    Task { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn delivers_the_result_once() {
        let task = spawn(|| 40 + 2);
        assert_eq!(task.take(), Some(42));
    }

    #[test]
    fn try_take_is_none_until_done() {
        let task = spawn(|| {
            thread::sleep(Duration::from_millis(50));
            "done"
        });
        // Freshly spawned worker is still sleeping
        assert_eq!(task.try_take(), None);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(task.try_take(), Some("done"));
    }

    #[test]
    fn worker_panic_yields_none() {
        let task: Task<()> = spawn(|| panic!("worker died"));
        assert_eq!(task.take(), None);
    }
}
