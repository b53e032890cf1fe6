//! Port abstraction for outstanding verification codes.
use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::OtpRecord;

use super::{RepositoryError, Versioned};

/// Outstanding codes keyed by lower-cased email address.
pub type OtpTable = BTreeMap<String, OtpRecord>;

/// Storage of the code table as one versioned document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Load the table; empty when nothing is stored.
    async fn load_codes(&self) -> Result<Versioned<OtpTable>, RepositoryError>;

    /// Replace the table if it is still at `expected_version`.
    async fn save_codes(
        &self,
        codes: &OtpTable,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError>;
}
