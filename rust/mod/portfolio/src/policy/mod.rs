//! Access-control and audit policy: pure decisions, no storage.

pub mod guardrail;
pub mod lifecycle;

pub use guardrail::{decide, Decision};
pub use lifecycle::{Auditor, Mutation};
