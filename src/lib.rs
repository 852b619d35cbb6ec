#![doc(test(attr(deny(warnings))))]

//! Boleto Core tracks supplier invoices ("boletos") split into installments
//! ("parcelas") across construction projects: it derives each installment's
//! payment-lifecycle status from its dates, keeps that status current over
//! time, and provides the filtering and aggregation views behind dashboards
//! and payment-control screens.

pub mod domain;
pub mod errors;
pub mod filter;
pub mod grouping;
pub mod storage;
pub mod store;
pub mod summary;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Boleto Core tracing initialized.");
    });
}
