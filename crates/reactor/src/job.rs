// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job object: an event source, a type bitset, user data and a lifecycle
//! state, bundled behind a cheaply cloneable handle.

use std::any::Any;
use std::fmt;
use std::os::fd::{IntoRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex as StdMutex};
use std::time::Instant;

use parking_lot::Mutex;
use reactor_core::{Error, Result};
use tracing::trace;

use crate::flags::JobType;
use crate::scheduler::Scheduler;
use crate::state::{JobState, RunOutcome};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        Self(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Exactly one of these is meaningful per job (§3 invariant).
#[derive(Debug, Clone, Copy)]
pub enum JobSource {
    None,
    Io { fd: RawFd },
    Timer,
    Signal { signum: i32 },
}

pub(crate) struct JobInner {
    id: JobId,
    job_type: JobType,
    state: Mutex<JobState>,
    source: Mutex<JobSource>,
    deadline: Mutex<Option<Instant>>,
    data: Mutex<Option<Box<dyn Any + Send>>>,
    callback: Mutex<Option<Box<dyn FnMut(&JobHandle) + Send>>>,
    done_cb: Mutex<Option<Box<dyn FnOnce(&JobHandle) + Send>>>,
    /// Set from inside a running callback to request the post-run transition.
    pending_outcome: Mutex<Option<RunOutcome>>,
    /// Backend registration tokens, opaque to everything outside `backend`.
    /// A combined I/O+timeout job carries two entries (one fd, one timer);
    /// both are cleared whenever the job fires, so a one-shot's loser
    /// registration never delivers a second, stale firing.
    registrations: Mutex<Vec<crate::backend::Registration>>,
    /// Owns the fd an I/O job was registered with, if any. Backend
    /// registration only ever needs the bare [`RawFd`] carried in
    /// [`JobSource::Io`]; this is the sole owning handle, dropped (closing
    /// the fd) at [`JobHandle::finalize`] unless `PRESERVE_FD` is set.
    owned_fd: Mutex<Option<OwnedFd>>,
    wait_gate: (StdMutex<bool>, Condvar),
    scheduler: Arc<dyn Scheduler>,
}

/// Cheaply cloneable reference to a job, handed to callbacks and callers.
#[derive(Clone)]
pub struct JobHandle(pub(crate) Arc<JobInner>);

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle").field("id", &self.0.id).finish()
    }
}

impl JobHandle {
    pub(crate) fn new(job_type: JobType, source: JobSource, scheduler: Arc<dyn Scheduler>) -> Self {
        Self(Arc::new(JobInner {
            id: JobId::next(),
            job_type,
            state: Mutex::new(JobState::Waiting),
            source: Mutex::new(source),
            deadline: Mutex::new(None),
            data: Mutex::new(None),
            callback: Mutex::new(None),
            done_cb: Mutex::new(None),
            pending_outcome: Mutex::new(None),
            registrations: Mutex::new(Vec::new()),
            owned_fd: Mutex::new(None),
            wait_gate: (StdMutex::new(false), Condvar::new()),
            scheduler,
        }))
    }

    /// Takes ownership of the fd backing an I/O job (`pool::add_io_job` and
    /// friends), so it can be closed without `unsafe` when the job is
    /// finalized.
    pub(crate) fn set_owned_fd(&self, fd: OwnedFd) {
        *self.0.owned_fd.lock() = Some(fd);
    }

    pub fn id(&self) -> JobId {
        self.0.id
    }

    pub fn job_type(&self) -> JobType {
        self.0.job_type
    }

    pub fn state(&self) -> JobState {
        *self.0.state.lock()
    }

    pub fn source(&self) -> JobSource {
        *self.0.source.lock()
    }

    pub fn deadline(&self) -> Option<Instant> {
        *self.0.deadline.lock()
    }

    pub fn set_deadline(&self, deadline: Option<Instant>) -> Result<()> {
        self.0.state.lock().check_mutate()?;
        *self.0.deadline.lock() = deadline;
        Ok(())
    }

    pub fn set_callback(&self, cb: impl FnMut(&JobHandle) + Send + 'static) -> Result<()> {
        self.0.state.lock().check_mutate()?;
        *self.0.callback.lock() = Some(Box::new(cb));
        Ok(())
    }

    pub fn set_done_callback(&self, cb: impl FnOnce(&JobHandle) + Send + 'static) -> Result<()> {
        self.0.state.lock().check_mutate()?;
        *self.0.done_cb.lock() = Some(Box::new(cb));
        Ok(())
    }

    pub fn set_data<T: Send + 'static>(&self, data: T) -> Result<()> {
        self.0.state.lock().check_mutate()?;
        *self.0.data.lock() = Some(Box::new(data));
        Ok(())
    }

    pub fn with_data<T: 'static, R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let guard = self.0.data.lock();
        f(guard.as_deref().and_then(|b| b.downcast_ref::<T>()))
    }

    /// Requests a rearm. Valid from `Waiting`, or from the job's own
    /// callback while `Running` if the job is `PERSIST` (§4.3).
    pub fn rearm(&self) -> Result<()> {
        let mut state = self.0.state.lock();
        let is_own_callback = matches!(*state, JobState::Running);
        state.check_rearm(self.0.job_type.is_persist(), is_own_callback)?;
        if is_own_callback {
            *self.0.pending_outcome.lock() = Some(RunOutcome::Rearmed);
        } else {
            *state = JobState::Armed;
            drop(state);
            self.0.scheduler.register(self);
        }
        trace!(job = %self.0.id, "rearm requested");
        Ok(())
    }

    /// Requests deletion. Valid from `Waiting`, or any state during
    /// shutdown (§4.3, §5).
    pub fn done(&self, pool_shutting_down: bool) -> Result<()> {
        let mut state = self.0.state.lock();
        state.check_done(pool_shutting_down)?;
        if matches!(*state, JobState::Running) {
            *self.0.pending_outcome.lock() = Some(RunOutcome::Done);
        } else {
            *state = JobState::NeedsDelete;
            drop(state);
            self.0.scheduler.enqueue(self.clone());
        }
        trace!(job = %self.0.id, "done requested");
        Ok(())
    }

    /// Blocks the calling thread until the job reaches `Waiting` or
    /// `Deleted`. Must not be called from the event thread (§4.3).
    pub fn wait(&self) {
        let (lock, cvar) = &self.0.wait_gate;
        let mut fired = lock.lock().unwrap_or_else(|e| e.into_inner());
        while !*fired {
            fired = cvar.wait(fired).unwrap_or_else(|e| e.into_inner());
        }
        *fired = false;
    }

    pub(crate) fn notify_waiters(&self) {
        let (lock, cvar) = &self.0.wait_gate;
        let mut fired = lock.lock().unwrap_or_else(|e| e.into_inner());
        *fired = true;
        cvar.notify_all();
    }

    pub(crate) fn set_registrations(&self, regs: Vec<crate::backend::Registration>) {
        *self.0.registrations.lock() = regs;
    }

    /// Takes every stored registration, leaving the job with none. Called
    /// by the event thread the moment a job fires, so its sibling
    /// registration (the timer half of an I/O+timeout job, or vice versa)
    /// cannot also deliver a firing for the same `Armed` period.
    pub(crate) fn take_registrations(&self) -> Vec<crate::backend::Registration> {
        std::mem::take(&mut self.0.registrations.lock())
    }

    pub(crate) fn transition_to(&self, next: JobState) {
        *self.0.state.lock() = next;
    }

    pub(crate) fn compare_and_transition(&self, expect: JobState, next: JobState) -> bool {
        let mut state = self.0.state.lock();
        if *state == expect {
            *state = next;
            true
        } else {
            false
        }
    }

    /// Runs the callback on a worker thread, returning the transition the
    /// state machine should make afterwards (§4.2).
    pub(crate) fn run_once(&self) -> JobState {
        *self.0.pending_outcome.lock() = None;
        {
            let mut cb = self.0.callback.lock();
            if let Some(cb) = cb.as_mut() {
                cb(self);
            }
        }
        let outcome = self.0.pending_outcome.lock().take().unwrap_or(RunOutcome::Plain);
        let next = JobState::Running.after_run(outcome, self.0.job_type.is_persist());
        self.transition_to(next);
        match next {
            JobState::Armed => self.0.scheduler.register(self),
            // Hand back to the queue rather than finalizing inline, so a
            // `done()` from inside the callback goes through the same
            // finalize path as a `done()` from `Waiting` (§4.2).
            JobState::NeedsDelete => self.0.scheduler.enqueue(self.clone()),
            JobState::Waiting | JobState::Deleted => self.notify_waiters(),
            JobState::Queued | JobState::Running => {}
        }
        next
    }

    /// Runs the done-callback, closes the fd unless PRESERVE_FD, and marks
    /// the job `Deleted`. Invoked by a worker (or a dedicated collector)
    /// once a job reaches `NeedsDelete` (§4.2).
    pub(crate) fn finalize(&self) {
        if let Some(cb) = self.0.done_cb.lock().take() {
            cb(self);
        }
        if let Some(owned) = self.0.owned_fd.lock().take() {
            if self.0.job_type.contains(JobType::PRESERVE_FD) {
                // Hand the fd back to whoever still owns it rather than
                // closing it; `into_raw_fd` does not run `OwnedFd`'s `Drop`.
                let _ = owned.into_raw_fd();
            }
            // Otherwise `owned` drops here, closing the fd.
        }
        self.transition_to(JobState::Deleted);
        self.notify_waiters();
        trace!(job = %self.0.id, "job deleted");
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
