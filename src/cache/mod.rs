//! Cache module for storing API responses on disk
//!
//! This module provides a flat-file key/value store whose entries expire after a
//! fixed TTL, plus the get-cached-or-fetch policy built on top of it. Expired
//! entries stay in the document until evicted so that callers can fall back to
//! stale data when the API is unavailable.

mod cached_fetch;
mod store;

pub use store::{CacheDocument, CacheEntry, StoreError, TtlStore, DEFAULT_TTL_HOURS};
