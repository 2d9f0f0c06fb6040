//! Worker pool for blocking recognition calls.
//!
//! Decoding is CPU-bound and not preemptible, so it never runs on the async
//! runtime. Connection tasks hand closures to a fixed set of OS threads and
//! await a oneshot reply. A connection awaits each job before submitting the
//! next one, which keeps its work strictly ordered; jobs from different
//! connections run in parallel up to the pool size and queue beyond it.
//!
//! Panics inside a job are caught and reported to the submitter instead of
//! taking the worker thread down.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum OffloadError {
    /// The job panicked while running
    #[error("Worker job panicked: {0}")]
    Panicked(String),

    /// The pool no longer accepts or completes work
    #[error("Worker pool is shut down")]
    Closed,

    /// A worker thread could not be started
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Default pool size: one thread per CPU plus a few spare, capped at 32.
pub fn default_pool_size() -> usize {
    (num_cpus::get() + 4).min(32)
}

/// Fixed-size pool of blocking worker threads.
pub struct WorkerPool {
    sender: mpsc::UnboundedSender<Job>,
    queued: Arc<AtomicUsize>,
    size: usize,
    _workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `size` workers.
    ///
    /// `thread_init` runs once on each worker, the first time it picks up a
    /// job.
    pub fn new<F>(size: usize, thread_init: F) -> Result<Self, OffloadError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let size = size.max(1);
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let thread_init = Arc::new(thread_init);
        let queued = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let receiver = Arc::clone(&receiver);
            let thread_init = Arc::clone(&thread_init);
            let queued = Arc::clone(&queued);

            let handle = std::thread::Builder::new()
                .name(format!("asr-worker-{index}"))
                .spawn(move || {
                    let mut initialized = false;
                    loop {
                        // Only one idle worker waits on the queue at a time.
                        let job = receiver.lock().blocking_recv();
                        let Some(job) = job else {
                            debug!(worker = index, "Worker queue closed, exiting");
                            break;
                        };
                        queued.fetch_sub(1, Ordering::Relaxed);
                        if !initialized {
                            thread_init();
                            initialized = true;
                        }
                        job();
                    }
                })?;
            workers.push(handle);
        }

        info!(workers = size, "Worker pool started");

        Ok(Self {
            sender,
            queued,
            size,
            _workers: workers,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Jobs submitted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Run `work` on a worker thread and wait for its result.
    ///
    /// Dropping the returned future does not cancel a job that already
    /// started; its result is discarded.
    pub async fn run<F, T>(&self, work: F) -> Result<T, OffloadError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(work)).map_err(|panic| {
                let message = panic_message(&panic);
                error!(message = %message, "Worker job panicked");
                message
            });
            let _ = reply_tx.send(outcome);
        });

        self.queued.fetch_add(1, Ordering::Relaxed);
        if self.sender.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(OffloadError::Closed);
        }

        let queued = self.queued();
        if queued > self.size {
            debug!(queued, workers = self.size, "Worker pool saturated, job queued");
        }

        match reply_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(OffloadError::Panicked(message)),
            Err(_) => Err(OffloadError::Closed),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("queued", &self.queued())
            .finish()
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
