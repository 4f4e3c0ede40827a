// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ldclt-core: owned domain types shared by the load generator's worker
//! threads — template rendering, random/DN formatting, shared counters,
//! the image pool, the async-request tracker, the missing-node creator,
//! replication op-list bookkeeping and the scalab01 session types.

pub mod async_tracker;
pub mod counters;
pub mod error;
pub mod image_pool;
pub mod ldap_client;
pub mod missing_node;
pub mod random;
pub mod replication;
pub mod scalab01;
pub mod template;

pub use async_tracker::{AsyncTracker, PendingRequest};
pub use counters::CommonCounter;
pub use error::{CounterError, ImagePoolError, TemplateError};
pub use image_pool::ImagePool;
pub use ldap_client::{Attr, LdapClient, OpError, SearchEntry};
pub use missing_node::create_missing_ancestors;
pub use random::{rand_dn_string, rand_int, saturating_incr, DataFile};
pub use replication::{OpKind, OpList, OpRecord};
pub use scalab01::{LoginGuard, ModemPool, Session, SessionQueue};
pub use template::{AttributeTemplate, ObjectScope, RenderSignal, TemplateFile};
