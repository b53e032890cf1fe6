//! Whole-collection repositories: accounts, municipalities and codes.
//!
//! Each collection is a single JSON document. A missing document reads as an
//! empty collection at version `None`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    KeyValueStore, MunicipalityRepository, OtpRepository, OtpTable, RepositoryError,
    UserRepository, Versioned,
};
use crate::domain::{Municipality, UserAccount};

use super::documents::{load, save};

/// Store key of the account collection.
pub const USERS_KEY: &str = "users";
/// Store key of the municipality registry.
pub const MUNICIPALITIES_KEY: &str = "municipalities";
/// Store key of the outstanding code table.
pub const OTP_CODES_KEY: &str = "otp_codes";

/// [`UserRepository`] storing accounts under [`USERS_KEY`].
#[derive(Clone)]
pub struct KvUserRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvUserRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for KvUserRepository {
    async fn load_users(&self) -> Result<Versioned<Vec<UserAccount>>, RepositoryError> {
        Ok(load(self.store.as_ref(), USERS_KEY)
            .await?
            .unwrap_or_else(|| Versioned::absent(Vec::new())))
    }

    async fn save_users(
        &self,
        users: &[UserAccount],
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        save(self.store.as_ref(), USERS_KEY, users, expected_version).await
    }
}

/// [`MunicipalityRepository`] storing the registry under [`MUNICIPALITIES_KEY`].
#[derive(Clone)]
pub struct KvMunicipalityRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvMunicipalityRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MunicipalityRepository for KvMunicipalityRepository {
    async fn load_municipalities(&self) -> Result<Versioned<Vec<Municipality>>, RepositoryError> {
        Ok(load(self.store.as_ref(), MUNICIPALITIES_KEY)
            .await?
            .unwrap_or_else(|| Versioned::absent(Vec::new())))
    }

    async fn save_municipalities(
        &self,
        municipalities: &[Municipality],
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        save(
            self.store.as_ref(),
            MUNICIPALITIES_KEY,
            municipalities,
            expected_version,
        )
        .await
    }
}

/// [`OtpRepository`] storing the code table under [`OTP_CODES_KEY`].
#[derive(Clone)]
pub struct KvOtpRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvOtpRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OtpRepository for KvOtpRepository {
    async fn load_codes(&self) -> Result<Versioned<OtpTable>, RepositoryError> {
        Ok(load(self.store.as_ref(), OTP_CODES_KEY)
            .await?
            .unwrap_or_else(|| Versioned::absent(OtpTable::new())))
    }

    async fn save_codes(
        &self,
        codes: &OtpTable,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        save(self.store.as_ref(), OTP_CODES_KEY, codes, expected_version).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for collection document handling.
    use super::*;
    use crate::domain::OtpRecord;
    use crate::domain::ports::{KeyValueStoreError, MockKeyValueStore, StoredBlob};
    use crate::outbound::kv::InMemoryKeyValueStore;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn memory_store() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }

    #[rstest]
    #[tokio::test]
    async fn missing_collections_read_as_empty() {
        let repo = KvUserRepository::new(memory_store());
        let loaded = repo.load_users().await.expect("load");
        assert!(loaded.value.is_empty());
        assert_eq!(loaded.version, None);
    }

    #[rstest]
    #[tokio::test]
    async fn code_table_round_trips_through_the_store() {
        let store = memory_store();
        let repo = KvOtpRepository::new(Arc::clone(&store));
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).single().expect("time");
        let mut table = OtpTable::new();
        table.insert(
            "agent@mairie.tn".to_owned(),
            OtpRecord::issue("123456".to_owned(), now),
        );

        repo.save_codes(&table, None).await.expect("first save");
        let loaded = repo.load_codes().await.expect("load");
        assert_eq!(loaded.value, table);
        assert!(loaded.version.is_some());

        let raw = store
            .get(OTP_CODES_KEY)
            .await
            .expect("read")
            .expect("present");
        assert!(raw.value.contains("expiresAt"));
    }

    #[rstest]
    #[tokio::test]
    async fn stale_saves_surface_as_version_conflicts() {
        let repo = KvMunicipalityRepository::new(memory_store());
        repo.save_municipalities(&[], None).await.expect("create");

        let err = repo
            .save_municipalities(&[], None)
            .await
            .expect_err("document already exists");
        assert_eq!(err, RepositoryError::version_conflict(MUNICIPALITIES_KEY));
    }

    #[rstest]
    #[tokio::test]
    async fn backend_failures_map_to_connection_errors() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(KeyValueStoreError::backend("disk offline")));
        let repo = KvUserRepository::new(Arc::new(store));

        let err = repo.load_users().await.expect_err("backend down");
        assert_eq!(err, RepositoryError::connection("disk offline"));
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_documents_map_to_serialization_errors() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| {
            Ok(Some(StoredBlob {
                value: "{not json".to_owned(),
                version: 3,
            }))
        });
        let repo = KvUserRepository::new(Arc::new(store));

        let err = repo.load_users().await.expect_err("corrupt document");
        assert!(matches!(err, RepositoryError::Serialization { .. }));
    }
}
