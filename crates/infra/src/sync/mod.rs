//! Reconciliation between the calendar and the ledger

pub mod reconciler;

pub use reconciler::{ReconcilerConfig, RelabelReconciler};
