//! Pure domain logic for the planned maintenance engine.
//!
//! This crate has zero internal deps so it can be used by the `db`
//! repository layer, the API handlers, and any future CLI tooling.
//! Everything here is synchronous and side-effect free; persistence
//! and orchestration live in `keelson-db` and `keelson-api`.

pub mod error;
pub mod hierarchy;
pub mod ledger;
pub mod plan;
pub mod stats;
pub mod types;
pub mod work_order;
