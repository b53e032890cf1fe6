//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`KeyValueStore`], [`VerificationNotifier`])
//! are implemented by outbound adapters. Driving ports ([`UserDirectory`],
//! [`OneTimeCodes`], [`MunicipalityRegistry`], the ledger ports) are
//! implemented by domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod budget_ledger_command;
mod budget_ledger_query;
mod key_value_store;
mod ledger_interchange;
mod ledger_repository;
mod municipality_registry;
mod municipality_repository;
mod one_time_codes;
mod otp_repository;
mod repository;
mod user_directory;
mod user_repository;
mod verification_notifier;

#[cfg(test)]
pub use budget_ledger_command::MockBudgetLedgerCommand;
pub use budget_ledger_command::BudgetLedgerCommand;
#[cfg(test)]
pub use budget_ledger_query::MockBudgetLedgerQuery;
pub use budget_ledger_query::BudgetLedgerQuery;
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{KeyValueStore, KeyValueStoreError, StoredBlob};
#[cfg(test)]
pub use ledger_interchange::MockLedgerInterchange;
pub use ledger_interchange::LedgerInterchange;
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
pub use ledger_repository::LedgerRepository;
#[cfg(test)]
pub use municipality_registry::MockMunicipalityRegistry;
pub use municipality_registry::MunicipalityRegistry;
#[cfg(test)]
pub use municipality_repository::MockMunicipalityRepository;
pub use municipality_repository::MunicipalityRepository;
#[cfg(test)]
pub use one_time_codes::MockOneTimeCodes;
pub use one_time_codes::OneTimeCodes;
#[cfg(test)]
pub use otp_repository::MockOtpRepository;
pub use otp_repository::{OtpRepository, OtpTable};
pub use repository::{RepositoryError, Versioned};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
#[cfg(test)]
pub use verification_notifier::MockVerificationNotifier;
pub use verification_notifier::{
    DeliveryId, NotifierError, UnconfiguredNotifier, VerificationMessage, VerificationNotifier,
};
