//! Request middleware and extractors.

pub mod identity;
