//! Background evaluation of runtimes.
//!
//! Each submitted [`Runtime`] runs `evaluate_all` as one job on a rayon
//! pool. Exactly one [`ExecutorEvent`] is delivered per job, over a
//! crossbeam channel. Failed jobs are not retried.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::error::RuntimeError;
use crate::image::WritableImage;
use crate::progress::ProgressPolicy;
use crate::runtime::Runtime;

/// Handle for a submitted job.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Outcome of one job.
pub enum ExecutorEvent {
    /// The whole world was evaluated; the job's destination images, by name.
    Completed {
        job: JobId,
        images: Vec<(String, Box<dyn WritableImage>)>,
    },
    Failed { job: JobId, error: RuntimeError },
}

impl ExecutorEvent {
    pub fn job(&self) -> JobId {
        match self {
            ExecutorEvent::Completed { job, .. } | ExecutorEvent::Failed { job, .. } => *job,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutorEvent::Completed { .. })
    }
}

impl fmt::Debug for ExecutorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorEvent::Completed { job, images } => {
                let names: Vec<&str> = images.iter().map(|(name, _)| name.as_str()).collect();
                f.debug_struct("Completed")
                    .field("job", job)
                    .field("images", &names)
                    .finish()
            }
            ExecutorEvent::Failed { job, error } => f
                .debug_struct("Failed")
                .field("job", job)
                .field("error", error)
                .finish(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to start the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Runs runtimes on a worker pool.
pub struct Executor {
    pool: rayon::ThreadPool,
    sender: Sender<ExecutorEvent>,
    receiver: Receiver<ExecutorEvent>,
    next_job: AtomicU64,
    /// Submitted jobs whose event has not been received yet.
    pending: Mutex<FxHashSet<JobId>>,
}

impl Executor {
    /// `threads == 0` uses rayon's default thread count.
    pub fn new(threads: usize) -> Result<Self, ExecutorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("rasc-worker-{i}"))
            .build()?;
        let (sender, receiver) = channel::unbounded();
        Ok(Executor {
            pool,
            sender,
            receiver,
            next_job: AtomicU64::new(0),
            pending: Mutex::new(FxHashSet::default()),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue a runtime for evaluation. Returns immediately.
    pub fn submit(&self, mut runtime: Runtime, progress: ProgressPolicy) -> JobId {
        let job = JobId(self.next_job.fetch_add(1, Ordering::Relaxed));
        self.pending.lock().insert(job);
        runtime.set_progress(progress);

        let sender = self.sender.clone();
        self.pool.spawn(move || {
            tracing::trace!(%job, "job started");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                runtime
                    .evaluate_all()
                    .map(|()| runtime.take_dest_images())
            }));
            let event = match outcome {
                Ok(Ok(images)) => ExecutorEvent::Completed { job, images },
                Ok(Err(error)) => ExecutorEvent::Failed { job, error },
                Err(payload) => ExecutorEvent::Failed {
                    job,
                    error: RuntimeError::Panicked {
                        message: panic_message(payload.as_ref()),
                    },
                },
            };
            tracing::trace!(%job, completed = event.is_completed(), "job finished");
            // The executor owns the receiver; a failed send means it is gone.
            let _ = sender.send(event);
        });
        tracing::trace!(%job, "job submitted");
        job
    }

    /// Block for the next event. `None` when no job is outstanding.
    pub fn recv(&self) -> Option<ExecutorEvent> {
        if self.pending.lock().is_empty() {
            return None;
        }
        let event = self.receiver.recv().ok()?;
        self.pending.lock().remove(&event.job());
        Some(event)
    }

    /// Next event if one is ready.
    pub fn try_recv(&self) -> Option<ExecutorEvent> {
        match self.receiver.try_recv() {
            Ok(event) => {
                self.pending.lock().remove(&event.job());
                Some(event)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until every outstanding job has reported.
    pub fn wait_all(&self) -> Vec<ExecutorEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.recv() {
            events.push(event);
        }
        events
    }

    /// Jobs submitted whose event has not been received.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("threads", &self.threads())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::image::{Image, RasterImage};
    use crate::test_helpers::compile_direct;

    fn runtime(text: &str, width: u32) -> Runtime {
        let mut runtime = Runtime::new(compile_direct(text));
        let src: Arc<dyn Image> = Arc::new(RasterImage::from_fn(width, 1, |x, _| x as f64));
        runtime.bind_source("src", src).unwrap();
        runtime
            .bind_dest("out", Box::new(RasterImage::new(width, 1)))
            .unwrap();
        runtime
    }

    #[test]
    fn test_completed_jobs_return_images() {
        let executor = Executor::new(2).unwrap();
        let first = executor.submit(runtime("out = src * 2;", 4), ProgressPolicy::none());
        let second = executor.submit(runtime("out = src + 1;", 4), ProgressPolicy::none());
        assert_ne!(first, second);

        let mut events = executor.wait_all();
        events.sort_by_key(ExecutorEvent::job);
        assert_eq!(events.len(), 2);
        assert_eq!(executor.pending(), 0);

        let expected = [vec![0.0, 2.0, 4.0, 6.0], vec![1.0, 2.0, 3.0, 4.0]];
        for (event, expected) in events.into_iter().zip(expected) {
            let ExecutorEvent::Completed { images, .. } = event else {
                panic!("expected completion, got {event:?}");
            };
            assert_eq!(images.len(), 1);
            let (name, image) = &images[0];
            assert_eq!(name, "out");
            let got: Vec<f64> = (0..4).map(|x| image.get(x, 0, 0)).collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_failed_job_reports_error() {
        let executor = Executor::new(1).unwrap();
        let job = executor.submit(runtime("out = src[-1, 0];", 2), ProgressPolicy::none());
        let event = executor.recv().unwrap();
        assert_eq!(event.job(), job);
        match event {
            ExecutorEvent::Failed { error, .. } => assert_eq!(
                error,
                RuntimeError::OutsideImage {
                    image: "src".to_string(),
                    x: -1.0,
                    y: 0.0,
                }
            ),
            ExecutorEvent::Completed { .. } => panic!("expected failure"),
        }
        assert!(executor.recv().is_none());
    }

    #[test]
    fn test_recv_without_jobs() {
        let executor = Executor::new(1).unwrap();
        assert!(executor.recv().is_none());
        assert!(executor.try_recv().is_none());
        assert!(executor.wait_all().is_empty());
        assert_eq!(format!("{}", JobId(3)), "job#3");
    }
}
