//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **kv**: key-value stores (in-memory and directory-backed)
//! - **persistence**: repositories storing collections as JSON documents
//! - **mail_relay**: HTTP client delivering verification codes
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod kv;
pub mod mail_relay;
pub mod persistence;
