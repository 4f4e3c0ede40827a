// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public API: pool construction/shutdown and job creation/arming.
//!
//! The event thread lives inside [`MioBackend::run_once`]; when it observes
//! a firing it transitions the job `Armed -> Queued` and hands it to the
//! work queue. Workers dequeue, transition `Queued -> Running`, invoke the
//! callback, and apply the post-run transition (§4.2).

use std::alloc::Layout;
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use reactor_core::{AllocHooks, AllocatedBlock, Error, Result, SystemAlloc};
use tracing::{debug, warn};

use crate::backend::MioBackend;
use crate::flags::JobType;
use crate::job::{JobHandle, JobSource};
use crate::queue::{WorkItem, WorkQueue};
use crate::scheduler::Scheduler;
use crate::state::JobState;

/// Approximate per-job control-block footprint, used only to size the
/// up-front job-slot reservation below; actual job state always lives in an
/// individually heap-allocated `Arc<JobInner>`.
const JOB_SLOT_BYTES: usize = 256;

struct PoolInner {
    queue: WorkQueue,
    backend: Mutex<MioBackend>,
    shutting_down: AtomicBool,
    /// Reserved through the configured `AllocHooks` at construction and
    /// freed through it on drop, mirroring the up-front job-slot table a
    /// fixed-size pool would reserve (§core-a-allocator). Held for its
    /// lifetime/drop effect; never read.
    _job_slots: Option<AllocatedBlock>,
}

impl Scheduler for PoolInner {
    fn register(&self, job: &JobHandle) {
        // A pure-compute job has nothing for the event thread to watch; it
        // goes straight onto the work queue instead of through the backend.
        if matches!(job.source(), JobSource::None) {
            if job.compare_and_transition(JobState::Armed, JobState::Queued) {
                self.queue.push(WorkItem::Job(job.clone()));
            }
            return;
        }

        let mut backend = self.backend.lock();
        let mut regs = Vec::new();
        match job.source() {
            JobSource::Io { fd } => {
                if let Ok(r) = backend.register_fd(job.clone(), fd, job.job_type()) {
                    regs.push(r);
                }
                if let Some(deadline) = job.deadline() {
                    regs.push(backend.register_timer(job.clone(), deadline));
                }
            }
            JobSource::Timer => {
                let deadline = job.deadline().unwrap_or_else(Instant::now);
                regs.push(backend.register_timer(job.clone(), deadline));
            }
            JobSource::Signal { signum } => {
                if let Ok(r) = backend.register_signal(job.clone(), signum) {
                    regs.push(r);
                }
            }
            JobSource::None => unreachable!("handled above"),
        }
        job.set_registrations(regs);
        backend.wake();
    }

    fn enqueue(&self, job: JobHandle) {
        self.queue.push(WorkItem::Job(job));
    }
}

/// Fixed-size worker pool multiplexing I/O, timeouts, signals and pure
/// compute jobs onto one event thread and `N` worker threads (§2, §4.2).
pub struct Pool {
    inner: Arc<PoolInner>,
    event_thread: Mutex<Option<JoinHandle<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl Pool {
    pub fn new(max_threads: usize) -> std::io::Result<Self> {
        Self::with_alloc_hooks(max_threads, Arc::new(SystemAlloc))
    }

    pub fn with_alloc_hooks(max_threads: usize, alloc: Arc<dyn AllocHooks>) -> std::io::Result<Self> {
        let backend = MioBackend::new()?;
        let job_slots = Layout::array::<u8>(max_threads.max(1) * JOB_SLOT_BYTES)
            .ok()
            .and_then(|layout| AllocatedBlock::calloc(alloc.clone(), layout));
        let inner = Arc::new(PoolInner {
            queue: WorkQueue::new(),
            backend: Mutex::new(backend),
            shutting_down: AtomicBool::new(false),
            _job_slots: job_slots,
        });

        let workers = (0..max_threads)
            .map(|idx| spawn_worker(idx, inner.clone()))
            .collect();

        let event_inner = inner.clone();
        #[allow(clippy::expect_used)]
        let event_thread = thread::Builder::new()
            .name("ns-event".into())
            .spawn(move || run_event_loop(event_inner))
            .expect("spawning the event thread should not fail under normal resource limits");

        Ok(Self {
            inner,
            event_thread: Mutex::new(Some(event_thread)),
            workers: Mutex::new(workers),
            worker_count: max_threads,
        })
    }

    fn check_not_shutdown(&self) -> Result<()> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            Err(Error::Shutdown)
        } else {
            Ok(())
        }
    }

    /// Creates an unarmed job (`ns_create_job`).
    pub fn create_job(&self, job_type: JobType, callback: impl FnMut(&JobHandle) + Send + 'static) -> Result<JobHandle> {
        self.check_not_shutdown()?;
        if !job_type.is_valid_for_creation() {
            return Err(Error::InvalidRequest);
        }
        let job = JobHandle::new(job_type, JobSource::None, self.inner.clone());
        job.set_callback(callback)?;
        Ok(job)
    }

    /// Creates and arms a job on `fd` (`ns_add_io_job`). `ACCEPT|THREAD` is
    /// rejected with no allocation performed (§8 A.5). Takes ownership of
    /// `fd`: unless `PRESERVE_FD` is set, it is closed when the job is
    /// finalized.
    pub fn add_io_job(
        &self,
        job_type: JobType,
        fd: OwnedFd,
        callback: impl FnMut(&JobHandle) + Send + 'static,
    ) -> Result<JobHandle> {
        self.check_not_shutdown()?;
        if !job_type.is_valid_for_creation() {
            return Err(Error::InvalidRequest);
        }
        let raw = fd.as_raw_fd();
        let job = JobHandle::new(job_type, JobSource::Io { fd: raw }, self.inner.clone());
        job.set_owned_fd(fd);
        job.set_callback(callback)?;
        self.arm(&job)?;
        Ok(job)
    }

    /// Creates and arms a pure timeout job (`ns_add_timeout_job`).
    pub fn add_timeout_job(
        &self,
        job_type: JobType,
        deadline: Instant,
        callback: impl FnMut(&JobHandle) + Send + 'static,
    ) -> Result<JobHandle> {
        self.check_not_shutdown()?;
        let job_type = job_type | JobType::TIMER;
        if !job_type.is_valid_for_creation() {
            return Err(Error::InvalidRequest);
        }
        let job = JobHandle::new(job_type, JobSource::Timer, self.inner.clone());
        job.set_callback(callback)?;
        job.set_deadline(Some(deadline))?;
        self.arm(&job)?;
        Ok(job)
    }

    /// Creates and arms a combined I/O+timeout job (`ns_add_io_timeout_job`).
    /// Whichever of the fd or the deadline fires first wins; the other
    /// registration is torn down the moment the job is dispatched (§4.1).
    pub fn add_io_timeout_job(
        &self,
        job_type: JobType,
        fd: OwnedFd,
        deadline: Instant,
        callback: impl FnMut(&JobHandle) + Send + 'static,
    ) -> Result<JobHandle> {
        self.check_not_shutdown()?;
        if !job_type.is_valid_for_creation() {
            return Err(Error::InvalidRequest);
        }
        let raw = fd.as_raw_fd();
        let job = JobHandle::new(job_type, JobSource::Io { fd: raw }, self.inner.clone());
        job.set_owned_fd(fd);
        job.set_callback(callback)?;
        job.set_deadline(Some(deadline))?;
        self.arm(&job)?;
        Ok(job)
    }

    /// Creates and arms a signal job (`ns_add_signal_job`).
    pub fn add_signal_job(
        &self,
        job_type: JobType,
        signum: i32,
        callback: impl FnMut(&JobHandle) + Send + 'static,
    ) -> Result<JobHandle> {
        self.check_not_shutdown()?;
        let job_type = job_type | JobType::SIGNAL;
        if !job_type.is_valid_for_creation() {
            return Err(Error::InvalidRequest);
        }
        let job = JobHandle::new(job_type, JobSource::Signal { signum }, self.inner.clone());
        job.set_callback(callback)?;
        self.arm(&job)?;
        Ok(job)
    }

    fn arm(&self, job: &JobHandle) -> Result<()> {
        job.transition_to(JobState::Armed);
        self.inner.register(job);
        Ok(())
    }

    /// Re-arms a `Waiting` job, or a `Running` persistent job from inside
    /// its own callback.
    pub fn rearm(&self, job: &JobHandle) -> Result<()> {
        job.rearm()
    }

    /// Schedules `job` for deletion.
    pub fn done(&self, job: &JobHandle) -> Result<()> {
        job.done(self.inner.shutting_down.load(Ordering::Acquire))
    }

    /// Sets the shutdown flag and feeds exactly `N` poison jobs so every
    /// worker observes one and exits (§4.2). Idempotent past the first call.
    pub fn shutdown(&self) {
        if self
            .inner
            .shutting_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!(workers = self.worker_count, "pool shutdown requested");
        for _ in 0..self.worker_count {
            self.inner.queue.push(WorkItem::ShutdownWorker);
        }
        self.inner.backend.lock().wake();
    }

    /// Joins every worker thread and the event thread. Must be called from
    /// a thread other than the event thread (§4.3).
    pub fn wait(&self) {
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            if let Err(e) = handle.join() {
                warn!(?e, "worker thread panicked");
            }
        }
        drop(workers);
        if let Some(handle) = self.event_thread.lock().take() {
            self.inner.backend.lock().wake();
            let _ = handle.join();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::Acquire)
    }
}

#[allow(clippy::expect_used)]
fn spawn_worker(idx: usize, inner: Arc<PoolInner>) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("ns-worker-{idx}"))
        .spawn(move || worker_loop(inner))
        .expect("spawning a worker thread should not fail under normal resource limits")
}

fn worker_loop(inner: Arc<PoolInner>) {
    loop {
        match inner.queue.pop() {
            None | Some(WorkItem::ShutdownWorker) => {
                debug!("worker exiting");
                return;
            }
            Some(WorkItem::Job(job)) => {
                if job.state() == JobState::NeedsDelete {
                    job.finalize();
                    continue;
                }
                if !job.compare_and_transition(JobState::Queued, JobState::Running) {
                    // Raced with a concurrent `done()`; nothing to run.
                    continue;
                }
                job.run_once();
            }
        }
    }
}

fn run_event_loop(inner: Arc<PoolInner>) {
    static LOOP_COUNTER: AtomicUsize = AtomicUsize::new(0);
    loop {
        if inner.shutting_down.load(Ordering::Acquire) {
            return;
        }
        let fired = inner.backend.lock().run_once(None);
        LOOP_COUNTER.fetch_add(1, Ordering::Relaxed);
        for firing in fired {
            let job = firing.job;
            for reg in job.take_registrations() {
                inner.backend.lock().deregister(reg);
            }
            if !job.compare_and_transition(JobState::Armed, JobState::Queued) {
                continue;
            }
            inner.queue.push(WorkItem::Job(job));
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
