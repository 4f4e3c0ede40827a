// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job type bitset.

use bitflags::bitflags;

bitflags! {
    /// What a job is armed for, and how its callback should be scheduled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JobType: u16 {
        const NONE            = 0x000;
        const ACCEPT          = 0x001;
        const CONNECT         = 0x002;
        const READ            = 0x004;
        const WRITE           = 0x008;
        const TIMER           = 0x010;
        const SIGNAL          = 0x020;
        const PERSIST         = 0x040;
        const THREAD          = 0x080;
        const PRESERVE_FD     = 0x100;
        /// Crate-private: never set by callers, carried by the poison jobs
        /// `Pool::shutdown` feeds to unblock every worker.
        const SHUTDOWN_WORKER = 0x200;
    }
}

impl JobType {
    pub fn is_io(self) -> bool {
        self.intersects(Self::ACCEPT | Self::READ | Self::CONNECT | Self::WRITE)
    }

    pub fn is_persist(self) -> bool {
        self.contains(Self::PERSIST)
    }

    pub fn is_thread(self) -> bool {
        self.contains(Self::THREAD)
    }

    /// `ACCEPT|THREAD` is rejected at creation: the listen backlog makes
    /// re-arming a worker-thread-dispatched accept job racy.
    pub fn is_valid_for_creation(self) -> bool {
        !(self.contains(Self::ACCEPT) && self.contains(Self::THREAD))
    }
}
