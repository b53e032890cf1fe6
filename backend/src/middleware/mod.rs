//! Actix middleware wrapped around every portal request.

pub mod trace;

pub use trace::Trace;
