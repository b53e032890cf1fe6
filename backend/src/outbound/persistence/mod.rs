//! Repository adapters persisting domain collections as JSON documents.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between domain types and
//!   stored documents. No business logic resides here.
//! - **One document per collection**: accounts, municipalities and codes are
//!   single documents; every ledger is its own document.
//! - **Optimistic concurrency**: saves go through
//!   [`KeyValueStore::compare_and_swap`](crate::domain::ports::KeyValueStore::compare_and_swap)
//!   and report stale versions as `RepositoryError::VersionConflict`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use budget_portal::domain::ports::KeyValueStore;
//! use budget_portal::outbound::kv::InMemoryKeyValueStore;
//! use budget_portal::outbound::persistence::KvUserRepository;
//!
//! let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
//! let users = KvUserRepository::new(store);
//! # let _ = users;
//! ```

mod collections;
mod documents;
mod ledgers;

pub use collections::{
    KvMunicipalityRepository, KvOtpRepository, KvUserRepository, MUNICIPALITIES_KEY,
    OTP_CODES_KEY, USERS_KEY,
};
pub use ledgers::{KvLedgerRepository, ledger_key};
