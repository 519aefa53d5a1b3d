use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, Span};

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};

/// A unit of work executed by a pool worker.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads fed by a bounded FIFO queue.
///
/// Jobs leave the queue in submission order; execution order across
/// workers is unspecified. Jobs always run outside the queue lock.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    config: PoolConfig,
}

struct Shared {
    queue: Mutex<Queue>,
    work_available: Condvar,
    room_available: Condvar,
}

/// Circular buffer: `head == tail` is empty, `head + 1 == tail` (mod len) is full.
struct Queue {
    slots: Vec<Option<Job>>,
    head: usize,
    tail: usize,
    running: bool,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            running: true,
        }
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    fn is_full(&self) -> bool {
        (self.head + 1) % self.slots.len() == self.tail
    }

    fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    fn push(&mut self, job: Job) {
        self.slots[self.head] = Some(job);
        self.head = (self.head + 1) % self.slots.len();
    }

    fn pop(&mut self) -> Option<Job> {
        if self.is_empty() {
            return None;
        }
        let job = self.slots.get_mut(self.tail).and_then(Option::take);
        self.tail = (self.tail + 1) % self.slots.len();
        job
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        // Jobs never run under this lock, so a poisoned guard still holds a
        // consistent queue.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkerPool {
    /// Start `config.workers` threads over a queue of `config.queue_capacity` slots.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::new(config.queue_capacity)),
            work_available: Condvar::new(),
            room_available: Condvar::new(),
        });

        let pool = Self {
            shared,
            workers: Mutex::new(Vec::with_capacity(config.workers)),
            config,
        };

        // Workers log inside the creator's span.
        let span = Span::current();
        for index in 0..config.workers {
            let shared = Arc::clone(&pool.shared);
            let span = span.clone();
            let spawned = thread::Builder::new()
                .name(format!("nsbox-worker-{index}"))
                .spawn(move || span.in_scope(|| worker_loop(&shared, index)));

            match spawned {
                Ok(handle) => pool.handles().push(handle),
                Err(source) => {
                    let _ = pool.shutdown();
                    return Err(PoolError::Spawn { index, source });
                }
            }
        }

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "worker pool started"
        );
        Ok(pool)
    }

    /// Queue a job, blocking while the queue is full.
    ///
    /// Fails with [`PoolError::Shutdown`] once shutdown has begun, including
    /// for a submitter that was waiting for room when it started.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.shared.lock();
        if !queue.running {
            return Err(PoolError::Shutdown);
        }

        while queue.is_full() && queue.running {
            queue = self
                .shared
                .room_available
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if !queue.running {
            return Err(PoolError::Shutdown);
        }

        queue.push(Box::new(job));
        self.shared.work_available.notify_one();
        Ok(())
    }

    /// Stop accepting jobs, run everything already queued, and join the workers.
    ///
    /// The first call owns the worker handles and waits for the drain; later
    /// or overlapping calls return immediately. The queue storage stays in
    /// place until the pool is dropped.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut queue = self.shared.lock();
            if queue.running {
                debug!(pending = queue.len(), "worker pool shutting down");
            }
            queue.running = false;
        }
        self.shared.work_available.notify_all();
        self.shared.room_available.notify_all();

        let handles = std::mem::take(&mut *self.handles());
        let mut panicked = None;
        for (index, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                panicked.get_or_insert(index);
            }
        }

        match panicked {
            Some(index) => Err(PoolError::WorkerPanicked(index)),
            None => Ok(()),
        }
    }

    /// Jobs waiting in the queue.
    pub fn pending(&self) -> usize {
        self.shared.lock().len()
    }

    /// True until shutdown begins.
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!(error = %err, "worker pool shutdown failed");
        }
    }
}

fn worker_loop(shared: &Shared, index: usize) {
    debug!(worker = index, "worker started");
    loop {
        let job = {
            let mut queue = shared.lock();
            while queue.is_empty() && queue.running {
                queue = shared
                    .work_available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            match queue.pop() {
                Some(job) => {
                    shared.room_available.notify_one();
                    job
                }
                None => break,
            }
        };

        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(worker = index, "job panicked");
        }
    }
    debug!(worker = index, "worker stopped");
}
