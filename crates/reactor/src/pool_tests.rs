// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::flags::JobType;
use std::os::unix::net::UnixStream;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn accept_and_thread_rejected_at_creation() {
    let pool = Pool::new(1).unwrap();
    let err = pool.create_job(JobType::ACCEPT | JobType::THREAD, |_| {});
    assert_eq!(err.unwrap_err(), Error::InvalidRequest);
    pool.shutdown();
    pool.wait();
}

#[test]
fn thread_pool_runs_many_create_and_done_jobs() {
    let pool = Pool::new(4).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for _ in 0..1000 {
        let c = counter.clone();
        let job = pool
            .create_job(JobType::THREAD, move |j| {
                c.fetch_add(1, Ordering::SeqCst);
                j.done(false).unwrap();
            })
            .unwrap();
        job.rearm().unwrap();
        handles.push(job);
    }
    for job in &handles {
        job.wait();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1000);
    pool.shutdown();
    pool.wait();
}

#[test]
fn persistent_read_job_fires_on_every_write() {
    let (reader, mut writer) = UnixStream::pair().unwrap();
    reader.set_nonblocking(true).unwrap();
    let pool = Pool::new(2).unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    let c2 = count.clone();
    // The job owns a dup'd fd (closed at finalize); `reader` keeps the
    // original for the callback's reads, both backed by the same socket.
    let fd: std::os::fd::OwnedFd = reader.try_clone().unwrap().into();
    let job = pool
        .add_io_job(JobType::READ | JobType::PERSIST, fd, move |j| {
            let mut buf = [0u8; 1];
            use std::io::Read;
            let mut r = &reader;
            if r.read_exact(&mut buf).is_ok() {
                c2.fetch_add(1, Ordering::SeqCst);
            }
            j.rearm().unwrap();
        })
        .unwrap();
    std::mem::forget(job);

    use std::io::Write;
    for _ in 0..100 {
        writer.write_all(b"x").unwrap();
        std::thread::sleep(Duration::from_millis(1));
    }
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(count.load(Ordering::SeqCst), 100);
    pool.shutdown();
    pool.wait();
}

#[test]
fn shutdown_unblocks_all_workers() {
    let pool = Pool::new(3).unwrap();
    pool.shutdown();
    pool.wait();
    assert!(pool.is_shutting_down());
}
