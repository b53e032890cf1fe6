//! Port abstraction for the account collection.
use async_trait::async_trait;

use crate::domain::UserAccount;

use super::{RepositoryError, Versioned};

/// Storage of the whole account collection as one versioned document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load every account; an empty collection when nothing is stored.
    async fn load_users(&self) -> Result<Versioned<Vec<UserAccount>>, RepositoryError>;

    /// Replace the collection if it is still at `expected_version`.
    async fn save_users(
        &self,
        users: &[UserAccount],
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError>;
}
