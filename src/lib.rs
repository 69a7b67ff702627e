//! # filepurge
//!
//! Rule-driven file expiration.
//!
//! filepurge walks the directories named by a [`rules::RuleSet`] on a
//! [`volume::StorageVolume`] and deletes files past an age threshold:
//!
//! - **Wildcard roots**: `*` path segments fan out over existing subdirectories
//! - **Extension filters**: case-insensitive suffix allow and deny lists
//! - **Empty-directory cleanup**: bottom-up, in the same run
//! - **Decision callbacks**: inspect or override every deletion before it happens
//! - **Cache expiry**: purge file caches by the expiration stored in each file

pub mod cache;
pub mod cli;
pub mod common;
pub mod purge;
pub mod rules;
pub mod volume;

pub use cache::CacheExpiryEngine;
pub use common::errors::{PurgeError, Result};
pub use purge::{Decision, DecisionCallback, PurgeEngine};
pub use rules::RuleSet;
pub use volume::{Entry, EntryKind, LocalVolume, MemoryVolume, StorageVolume};
