//! Background aggregation worker.
//!
//! [`AggregationWorker`] runs one [`DifferenceEngine`] on a dedicated thread
//! so the caller stays responsive while thousands of captures are decoded.
//! The caller observes the run through [`WorkerEvent`]s and can stop it at
//! any time with [`AggregationWorker::cancel`].
//!
//! ```text
//! ┌─────────────┐      unbounded channel      ┌──────────────────┐
//! │   Caller    │ ◀──── WorkerEvent ───────── │ tofcal-aggregator│
//! │             │ ───── CancelToken ────────▶ │ (decode + sum)   │
//! └─────────────┘                             └──────────────────┘
//! ```
//!
//! Exactly one [`WorkerEvent::Finished`] is sent per run, and it is always the
//! last event.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::difference::{Channel, DifferenceEngine, DifferenceError, DifferenceResult};
use crate::waveform::{AggregateOutcome, CancelToken};

/// Result carried by [`WorkerEvent::Finished`].
pub type WorkerResult = Result<AggregateOutcome<DifferenceResult>, DifferenceError>;

/// Notification from the worker thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Capture files found in both folders.
    Started {
        /// Measurement plus background files.
        total: usize,
    },
    /// One more capture file was processed.
    Progress {
        /// Folder the file belongs to.
        channel: Channel,
        /// Files processed so far across both folders.
        processed: usize,
        /// Measurement plus background files.
        total: usize,
    },
    /// The run ended.
    Finished(WorkerResult),
}

/// Errors raised by the worker itself, as opposed to the run it performs.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The thread could not be started
    #[error("Failed to spawn aggregation thread: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// The worker thread panicked
    #[error("Aggregation thread panicked")]
    ThreadPanicked,

    /// The worker exited without reporting a result
    #[error("Aggregation thread exited without a result")]
    Disconnected,

    /// The run itself failed
    #[error(transparent)]
    Run(#[from] DifferenceError),
}

/// Handle to a running aggregation.
pub struct AggregationWorker {
    events: Receiver<WorkerEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl AggregationWorker {
    /// Start `engine` on a new thread named `tofcal-aggregator`.
    pub fn spawn(engine: DifferenceEngine) -> Result<Self, WorkerError> {
        Self::spawn_with_token(engine, CancelToken::new())
    }

    /// Start `engine` using an existing cancellation token.
    pub fn spawn_with_token(
        engine: DifferenceEngine,
        cancel: CancelToken,
    ) -> Result<Self, WorkerError> {
        let (sender, events) = unbounded::<WorkerEvent>();
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name("tofcal-aggregator".to_string())
            .spawn(move || {
                let result = run(&engine, &token, &sender);
                // Receiver may already be gone; nothing left to report to.
                let _ = sender.send(WorkerEvent::Finished(result));
            })
            .map_err(WorkerError::SpawnFailed)?;

        Ok(Self {
            events,
            cancel,
            handle: Some(handle),
        })
    }

    /// Ask the worker to stop. The run ends with
    /// [`AggregateOutcome::Aborted`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the run ends, passing every progress event to `observer`.
    pub fn wait_with<F>(mut self, mut observer: F) -> Result<AggregateOutcome<DifferenceResult>, WorkerError>
    where
        F: FnMut(&WorkerEvent),
    {
        let mut finished = None;
        for event in self.events.iter() {
            if let WorkerEvent::Finished(result) = event {
                finished = Some(result);
                break;
            }
            observer(&event);
        }

        let handle = self.handle.take().ok_or(WorkerError::Disconnected)?;
        handle.join().map_err(|_| WorkerError::ThreadPanicked)?;

        match finished {
            Some(result) => Ok(result?),
            None => Err(WorkerError::Disconnected),
        }
    }

    /// Block until the run ends, discarding progress events.
    pub fn wait(self) -> Result<AggregateOutcome<DifferenceResult>, WorkerError> {
        self.wait_with(|_| {})
    }
}

impl Drop for AggregationWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::warn!("AggregationWorker dropped while running; cancelling");
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}

fn run(engine: &DifferenceEngine, cancel: &CancelToken, sender: &Sender<WorkerEvent>) -> WorkerResult {
    let measurement_files = engine.measurement().count_files()?;
    let total = measurement_files + engine.background().count_files()?;
    let _ = sender.send(WorkerEvent::Started { total });

    engine.run(cancel, |channel, n| {
        let processed = match channel {
            Channel::Measurement => n,
            Channel::Background => measurement_files + n,
        };
        let _ = sender.send(WorkerEvent::Progress {
            channel,
            processed,
            total,
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::FolderAggregator;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_capture(dir: &Path, name: &str, samples: &[u32]) {
        let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        fs::write(dir.join(name), bytes).unwrap();
    }

    fn engine(root: &Path) -> DifferenceEngine {
        let meas = root.join("meas");
        let bg = root.join("bg");
        fs::create_dir_all(&meas).unwrap();
        fs::create_dir_all(&bg).unwrap();
        write_capture(&meas, "Ch1_1.data32", &[10, 20, 30]);
        write_capture(&meas, "Ch1_2.data32", &[1, 2, 3]);
        write_capture(&bg, "Ch1_1.data32", &[1, 1, 1]);
        DifferenceEngine::new(FolderAggregator::new(meas), FolderAggregator::new(bg))
    }

    #[test]
    fn test_worker_reports_progress_and_result() {
        let dir = tempdir().unwrap();
        let worker = AggregationWorker::spawn(engine(dir.path())).unwrap();

        let mut progress = Vec::new();
        let outcome = worker
            .wait_with(|event| {
                if let WorkerEvent::Progress {
                    processed, total, ..
                } = event
                {
                    progress.push((*processed, *total));
                }
            })
            .unwrap();

        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        let result = outcome.completed().unwrap();
        assert_eq!(result.difference.samples(), &[10.0, 21.0, 32.0]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let dir = tempdir().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let worker = AggregationWorker::spawn_with_token(engine(dir.path()), token).unwrap();
        assert!(worker.wait().unwrap().is_aborted());
    }

    #[test]
    fn test_run_error_is_reported() {
        let dir = tempdir().unwrap();
        let engine = DifferenceEngine::new(
            FolderAggregator::new(dir.path().join("missing")),
            FolderAggregator::new(dir.path()),
        );
        let err = AggregationWorker::spawn(engine).unwrap().wait().unwrap_err();
        assert!(matches!(err, WorkerError::Run(_)));
    }
}
