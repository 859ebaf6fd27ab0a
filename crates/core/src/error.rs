use crate::types::DbId;

/// Domain error taxonomy shared by every engine operation.
///
/// Per-record failures inside bulk operations are *not* propagated as
/// errors; they are collected into the bulk response. These variants cover
/// the single-operation failure modes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Out-of-range or missing input (negative hours, bad interval, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("Unknown {entity} with id {id}")]
    Referential { entity: &'static str, id: DbId },

    /// An equipment reparent would make a node its own ancestor.
    #[error("Equipment cycle detected: {0}")]
    Cycle(String),

    /// Illegal work order status change, including acting on a terminal
    /// order. Losers of a concurrent compare-and-set also land here.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Cross-entity state that should not occur (e.g. a plan referencing
    /// deleted equipment). Logged and skipped during sweeps, never fatal.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    /// Anything unexpected. The message is logged, not shown verbatim.
    #[error("Internal error: {0}")]
    Internal(String),
}
