//! Per-test deadline enforcement

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::run::runtime::CancelToken;
use crate::EXIT_TIMEOUT;

/// An armed deadline bound to exactly one in-flight test.
///
/// The guard parks a worker thread on a disarm channel. If the deadline
/// passes first, the worker requests cooperative cancellation through the
/// [`CancelToken`] and gives the runtime a grace window to honor it; a
/// runtime that cannot cancel, or ignores the token past the window, gets
/// the crash-style fallback: the whole process exits with [`EXIT_TIMEOUT`].
/// Resources held by the hung test are not reclaimed; process restart is
/// the recovery mechanism.
#[derive(Debug)]
pub struct TimeoutGuard {
    disarm_tx: mpsc::Sender<()>,
    worker: Option<thread::JoinHandle<()>>,
}

impl TimeoutGuard {
    /// Arm a guard for `deadline`. `cooperative` declares whether the
    /// runtime honors the cancel token.
    pub fn arm(
        deadline: Duration,
        cancel: CancelToken,
        cooperative: bool,
        grace: Duration,
    ) -> Self {
        let (disarm_tx, disarm_rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            match disarm_rx.recv_timeout(deadline) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {}
            }
            if cooperative {
                cancel.cancel();
                match disarm_rx.recv_timeout(grace) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
            // A subscriber cannot be assumed on this path; write straight
            // to stderr before taking the process down.
            eprintln!("testrun-rs: test exceeded its deadline; aborting the run");
            std::process::exit(EXIT_TIMEOUT);
        });
        TimeoutGuard {
            disarm_tx,
            worker: Some(worker),
        }
    }

    /// Disarm the guard after normal completion and reap the worker
    pub fn disarm(mut self) {
        let _ = self.disarm_tx.send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        let _ = self.disarm_tx.send(());
    }
}
