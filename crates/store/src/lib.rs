// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable content store for the Agent Kernel: a write-ahead log of
//! [`event::Event`]s folded into a [`state::MaterializedState`], exposed
//! through the [`store::ContentStore`] API that the kernel and worker
//! crates consume (§4, §6).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod event;
pub mod state;
pub mod store;
pub mod wal;

pub use error::StoreError;
pub use event::Event;
pub use state::MaterializedState;
pub use store::{ContentStore, RateLimitOutcome, SystemContentStore};
pub use wal::{Wal, WalEntry, WalError};
