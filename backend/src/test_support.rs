//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and the integration suites in `tests/`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::budget::BudgetLedger;
use crate::domain::ports::{
    DeliveryId, KeyValueStore, LedgerRepository, NotifierError, RepositoryError,
    VerificationMessage, VerificationNotifier, Versioned,
};
use crate::domain::{
    DisplayName, EmailAddress, InterchangeService, LedgerService, Municipality, MunicipalityId,
    MunicipalityService, NewMunicipality, NewUser, OtpService, Password, RandomCodeGenerator, Role,
    UserAccount, UserDirectoryService, UserId,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::kv::InMemoryKeyValueStore;
use crate::outbound::persistence::{
    KvLedgerRepository, KvMunicipalityRepository, KvOtpRepository, KvUserRepository,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock whose current instant only moves when a test advances it.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(Duration::seconds(seconds));
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        lock(&self.0)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Versioned ledger documents keyed by municipality.
#[derive(Debug, Default)]
pub struct StubLedgers(Mutex<HashMap<MunicipalityId, (BudgetLedger, u64)>>);

impl StubLedgers {
    fn lock_ledgers(&self) -> MutexGuard<'_, HashMap<MunicipalityId, (BudgetLedger, u64)>> {
        lock(&self.0)
    }
}

#[async_trait]
impl LedgerRepository for StubLedgers {
    async fn load_ledger(
        &self,
        municipality_id: &MunicipalityId,
    ) -> Result<Option<Versioned<BudgetLedger>>, RepositoryError> {
        Ok(self
            .lock_ledgers()
            .get(municipality_id)
            .map(|(ledger, version)| Versioned::new(ledger.clone(), Some(*version))))
    }

    async fn save_ledger(
        &self,
        ledger: &BudgetLedger,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock_ledgers();
        let current = guard.get(ledger.municipality_id()).map(|(_, version)| *version);
        if current != expected_version {
            return Err(RepositoryError::version_conflict(format!(
                "budget:{}",
                ledger.municipality_id()
            )));
        }
        guard.insert(
            ledger.municipality_id().clone(),
            (ledger.clone(), current.map_or(1, |version| version + 1)),
        );
        Ok(())
    }

    async fn delete_ledger(&self, municipality_id: &MunicipalityId) -> Result<(), RepositoryError> {
        self.lock_ledgers().remove(municipality_id);
        Ok(())
    }
}

/// Notifier that accepts every message and remembers it.
#[derive(Debug, Default)]
pub struct CapturingNotifier(Mutex<Vec<VerificationMessage>>);

impl CapturingNotifier {
    /// The most recent code sent to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        lock(&self.0)
            .iter()
            .rev()
            .find(|message| message.to.eq_ignore_ascii_case(email))
            .map(|message| message.code.as_str().to_owned())
    }

    pub fn sent(&self) -> usize {
        lock(&self.0).len()
    }
}

#[async_trait]
impl VerificationNotifier for CapturingNotifier {
    async fn send(&self, message: &VerificationMessage) -> Result<DeliveryId, NotifierError> {
        let mut sent = lock(&self.0);
        sent.push(message.clone());
        Ok(DeliveryId(format!("captured-{}", sent.len())))
    }
}

pub const ADMIN_EMAIL: &str = "admin@mairie.tn";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const EMPLOYEE_EMAIL: &str = "receveur@mairie.tn";
pub const EMPLOYEE_PASSWORD: &str = "employee-password";

/// Fully wired portal over an in-memory store, seeded with one
/// administrator and one employee.
pub struct PortalHarness {
    pub state: HttpState,
    pub store: Arc<InMemoryKeyValueStore>,
    pub notifier: Arc<CapturingNotifier>,
    pub clock: Arc<MutableClock>,
    pub admin: UserAccount,
    pub employee: UserAccount,
}

impl PortalHarness {
    pub async fn start() -> Self {
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0)
                .single()
                .expect("valid harness instant"),
        ));
        let time: Arc<dyn Clock> = clock.clone();
        let store = Arc::new(InMemoryKeyValueStore::new());
        let kv: Arc<dyn KeyValueStore> = store.clone();

        let user_records = Arc::new(KvUserRepository::new(kv.clone()));
        let municipality_records = Arc::new(KvMunicipalityRepository::new(kv.clone()));
        let ledgers = Arc::new(KvLedgerRepository::new(kv.clone()));
        let notifier = Arc::new(CapturingNotifier::default());

        let users = Arc::new(UserDirectoryService::new(user_records.clone(), time.clone()));
        let codes = Arc::new(OtpService::new(
            Arc::new(KvOtpRepository::new(kv)),
            notifier.clone(),
            Arc::new(RandomCodeGenerator),
            time.clone(),
        ));
        let municipalities = Arc::new(MunicipalityService::new(
            municipality_records.clone(),
            user_records,
            ledgers.clone(),
            time.clone(),
        ));
        let ledger = Arc::new(LedgerService::new(ledgers.clone(), time.clone()));
        let interchange = Arc::new(InterchangeService::new(
            ledgers,
            municipality_records,
            time.clone(),
        ));

        let state = HttpState::new(
            HttpStatePorts {
                users,
                codes,
                municipalities,
                ledger: ledger.clone(),
                ledger_commands: ledger,
                interchange,
            },
            time,
        );
        let admin = create_account(&state, ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin, "Admin").await;
        let employee = create_account(
            &state,
            EMPLOYEE_EMAIL,
            EMPLOYEE_PASSWORD,
            Role::Employee,
            "Receveur",
        )
        .await;

        Self {
            state,
            store,
            notifier,
            clock,
            admin,
            employee,
        }
    }

    /// Register a municipality directly through the registry port.
    pub async fn register_municipality(
        &self,
        name: &str,
        code: &str,
        owner: Option<&UserId>,
    ) -> Municipality {
        let input = NewMunicipality::try_new(name, code, name, None, owner.cloned())
            .expect("valid harness municipality");
        self.state
            .municipalities
            .create(input)
            .await
            .expect("harness municipality created")
    }
}

async fn create_account(
    state: &HttpState,
    email: &str,
    password: &str,
    role: Role,
    name: &str,
) -> UserAccount {
    state
        .users
        .create(NewUser {
            email: EmailAddress::new(email).expect("valid harness email"),
            password: Password::new(password).expect("valid harness password"),
            role,
            display_name: DisplayName::new(name).expect("valid harness name"),
        })
        .await
        .expect("harness account created")
}
