//! Builders wiring storage, notifier and services into the HTTP state.

use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use reqwest::Url;
use tracing::{info, warn};

use budget_portal::domain::ports::{KeyValueStore, UnconfiguredNotifier, VerificationNotifier};
use budget_portal::domain::{
    DemoDataSeeder, DisplayName, EmailAddress, InterchangeService, LedgerService,
    MunicipalityService, NewUser, OtpService, Password, RandomCodeGenerator, Role,
    UserDirectoryService,
};
use budget_portal::inbound::http::state::{HttpState, HttpStatePorts};
use budget_portal::outbound::kv::{FileKeyValueStore, InMemoryKeyValueStore};
use budget_portal::outbound::mail_relay::MailRelayNotifier;
use budget_portal::outbound::persistence::{
    KvLedgerRepository, KvMunicipalityRepository, KvOtpRepository, KvUserRepository,
};

use super::PortalSettings;

const BOOTSTRAP_ADMIN_NAME: &str = "Administrateur Principal";

fn build_store(settings: &PortalSettings) -> io::Result<Arc<dyn KeyValueStore>> {
    match &settings.data_dir {
        Some(dir) => {
            let store = FileKeyValueStore::open(dir).map_err(io::Error::other)?;
            info!(data_dir = %dir.display(), "using file document store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("no data directory configured; data is lost on restart");
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
    }
}

fn build_notifier(settings: &PortalSettings) -> io::Result<Arc<dyn VerificationNotifier>> {
    let Some(raw) = settings.mail_relay_url.as_deref() else {
        warn!("no mail relay configured; login codes cannot be delivered");
        return Ok(Arc::new(UnconfiguredNotifier));
    };
    let base = Url::parse(raw)
        .map_err(|err| io::Error::other(format!("invalid mail relay url {raw}: {err}")))?;
    let notifier = MailRelayNotifier::new(&base, settings.mail_relay_timeout())
        .map_err(io::Error::other)?;
    info!(endpoint = %notifier.endpoint(), "delivering login codes through mail relay");
    Ok(Arc::new(notifier))
}

/// Wire repositories over the configured store into the domain services.
pub(super) fn build_http_state(settings: &PortalSettings) -> io::Result<HttpState> {
    let store = build_store(settings)?;
    let notifier = build_notifier(settings)?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let user_records = Arc::new(KvUserRepository::new(store.clone()));
    let municipality_records = Arc::new(KvMunicipalityRepository::new(store.clone()));
    let ledgers = Arc::new(KvLedgerRepository::new(store.clone()));

    let users = Arc::new(UserDirectoryService::new(user_records.clone(), clock.clone()));
    let codes = Arc::new(
        OtpService::new(
            Arc::new(KvOtpRepository::new(store)),
            notifier,
            Arc::new(RandomCodeGenerator),
            clock.clone(),
        )
        .with_delivery_timeout(settings.mail_relay_timeout()),
    );
    let municipalities = Arc::new(MunicipalityService::new(
        municipality_records.clone(),
        user_records,
        ledgers.clone(),
        clock.clone(),
    ));
    let ledger = Arc::new(LedgerService::new(ledgers.clone(), clock.clone()));
    let interchange = Arc::new(InterchangeService::new(
        ledgers,
        municipality_records,
        clock.clone(),
    ));

    Ok(HttpState::new(
        HttpStatePorts {
            users,
            codes,
            municipalities,
            ledger: ledger.clone(),
            ledger_commands: ledger,
            interchange,
        },
        clock,
    ))
}

fn bootstrap_account(email: &str, password: &str) -> io::Result<NewUser> {
    let invalid = |err: &dyn std::fmt::Display| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid bootstrap administrator: {err}"),
        )
    };
    Ok(NewUser {
        email: EmailAddress::new(email).map_err(|err| invalid(&err))?,
        password: Password::new(password).map_err(|err| invalid(&err))?,
        role: Role::Admin,
        display_name: DisplayName::new(BOOTSTRAP_ADMIN_NAME).map_err(|err| invalid(&err))?,
    })
}

/// Create the bootstrap administrator and demonstration data when asked.
pub(super) async fn prepare_data(state: &HttpState, settings: &PortalSettings) -> io::Result<()> {
    match settings.bootstrap_admin() {
        Some((email, password)) => {
            let created = state
                .users
                .ensure_bootstrap_admin(bootstrap_account(email, password)?)
                .await
                .map_err(io::Error::other)?;
            if !created {
                info!("user directory not empty; bootstrap administrator skipped");
            }
        }
        None => {
            let empty = state
                .users
                .list()
                .await
                .map_err(io::Error::other)?
                .is_empty();
            if empty {
                warn!("user directory is empty and no bootstrap administrator is configured");
            }
        }
    }

    if settings.seed_demo_data {
        let mut seeder = DemoDataSeeder::new(
            state.users.clone(),
            state.municipalities.clone(),
            state.ledger_commands.clone(),
            state.interchange.clone(),
        );
        if let Some(seed) = settings.demo_seed {
            seeder = seeder.with_seed(seed);
        }
        if let Some(summary) = seeder.seed().await.map_err(io::Error::other)? {
            info!(?summary, "demonstration data seeded");
        }
    }
    Ok(())
}
