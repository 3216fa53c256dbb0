//! Accrual state: counters, escalation and the snapshot form.

pub mod snapshot;
pub mod store;

pub use snapshot::AccrualSnapshot;
pub use store::{AccrualEvent, AccrualRecord, AccrualStore, MembershipStatus, Thresholds};
