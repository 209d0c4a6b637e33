//! Caching primitives.
//!
//! Every cache tier in the search-path service is a [`MemoizedAsyncCache`];
//! the tiers differ only in key shape, TTL and what invalidates them.

mod memoized;

pub use memoized::MemoizedAsyncCache;
