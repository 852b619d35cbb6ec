//! Domain models for installments, their lifecycle status, and the read-only
//! supplier/project context they reference.

pub mod installment;
pub mod project;
pub mod status;
pub mod supplier;

pub use installment::{Installment, LifecycleStatus};
pub use project::{Project, ProjectSnapshot};
pub use status::classify;
pub use supplier::{PartyKind, Supplier};
