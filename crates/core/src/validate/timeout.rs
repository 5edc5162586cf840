//! Bounded execution on a worker thread.

use std::sync::mpsc::{RecvTimeoutError, sync_channel};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError {
    #[error("timed out after {0:?}")]
    Elapsed(Duration),
    #[error("worker thread terminated without a result")]
    Disconnected,
}

/// Run `job` on a new thread and wait at most `limit` for its result.
///
/// On timeout the worker is left to finish on its own; its result is
/// discarded.
pub fn run_with_timeout<T, F>(limit: Duration, job: F) -> Result<T, TimeoutError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = sync_channel(1);
    std::thread::Builder::new()
        .name("pdfa3pack-validate".into())
        .spawn(move || {
            // the receiver may be gone after a timeout
            let _ = tx.send(job());
        })
        .map_err(|_| TimeoutError::Disconnected)?;

    match rx.recv_timeout(limit) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(TimeoutError::Elapsed(limit)),
        Err(RecvTimeoutError::Disconnected) => Err(TimeoutError::Disconnected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_job_returns_value() {
        assert_eq!(run_with_timeout(Duration::from_secs(5), || 7), Ok(7));
    }

    #[test]
    fn slow_job_times_out() {
        let limit = Duration::from_millis(20);
        let result = run_with_timeout(limit, || {
            std::thread::sleep(Duration::from_millis(500));
            1
        });
        assert_eq!(result, Err(TimeoutError::Elapsed(limit)));
    }

    #[test]
    fn panicking_job_is_disconnected() {
        let result: Result<(), _> = run_with_timeout(Duration::from_secs(5), || panic!("boom"));
        assert_eq!(result, Err(TimeoutError::Disconnected));
    }
}
