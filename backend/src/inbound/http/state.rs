//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    BudgetLedgerCommand, BudgetLedgerQuery, LedgerInterchange, MunicipalityRegistry,
    OneTimeCodes, UserDirectory,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserDirectory>,
    pub codes: Arc<dyn OneTimeCodes>,
    pub municipalities: Arc<dyn MunicipalityRegistry>,
    pub ledger: Arc<dyn BudgetLedgerQuery>,
    pub ledger_commands: Arc<dyn BudgetLedgerCommand>,
    pub interchange: Arc<dyn LedgerInterchange>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserDirectory>,
    pub codes: Arc<dyn OneTimeCodes>,
    pub municipalities: Arc<dyn MunicipalityRegistry>,
    pub ledger: Arc<dyn BudgetLedgerQuery>,
    pub ledger_commands: Arc<dyn BudgetLedgerCommand>,
    pub interchange: Arc<dyn LedgerInterchange>,
    /// Time source stamping session login times.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Construct state from a ports bundle and a clock.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use budget_portal::domain::ports::{
    ///     BudgetLedgerCommand, BudgetLedgerQuery, LedgerInterchange, MunicipalityRegistry,
    ///     OneTimeCodes, UserDirectory,
    /// };
    /// use budget_portal::inbound::http::state::{HttpState, HttpStatePorts};
    /// use mockable::DefaultClock;
    ///
    /// fn build(
    ///     users: Arc<dyn UserDirectory>,
    ///     codes: Arc<dyn OneTimeCodes>,
    ///     municipalities: Arc<dyn MunicipalityRegistry>,
    ///     ledger: Arc<dyn BudgetLedgerQuery>,
    ///     ledger_commands: Arc<dyn BudgetLedgerCommand>,
    ///     interchange: Arc<dyn LedgerInterchange>,
    /// ) -> HttpState {
    ///     HttpState::new(
    ///         HttpStatePorts { users, codes, municipalities, ledger, ledger_commands, interchange },
    ///         Arc::new(DefaultClock),
    ///     )
    /// }
    /// ```
    pub fn new(ports: HttpStatePorts, clock: Arc<dyn Clock>) -> Self {
        let HttpStatePorts {
            users,
            codes,
            municipalities,
            ledger,
            ledger_commands,
            interchange,
        } = ports;
        Self {
            users,
            codes,
            municipalities,
            ledger,
            ledger_commands,
            interchange,
            clock,
        }
    }
}
