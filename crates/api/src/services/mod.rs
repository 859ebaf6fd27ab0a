//! Orchestration services: multi-step operations that combine core logic
//! with repository writes. Handlers stay thin and delegate here.

pub mod ledger;
pub mod lifecycle;
pub mod notify;
pub mod scheduler;
