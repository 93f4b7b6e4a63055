// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rate-limit bucket event handlers (§5 "Rate-limit buckets are
//! process-wide keyed by `(key, windowStart)` via atomic increment").

use super::MaterializedState;
use crate::event::Event;

pub(crate) fn bucket_key(key: &str, window_start: i64) -> String {
    format!("{key}:{window_start}")
}

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    if let Event::RateLimitConsumed { key, window_start, count } = event {
        let bucket = bucket_key(key, *window_start);
        let current = state.rate_limit_buckets.entry(bucket).or_insert(0);
        // The count recorded by the event is the post-increment value
        // computed at write time; replay must converge to the same value
        // rather than re-incrementing on top of it.
        if *current < *count {
            *current = *count;
        }
    }
}
