//! Client-side data synchronization for the country/city admin backend:
//! typed REST clients, a de-duplicating query cache and a mutation
//! executor that keeps cached listings consistent after writes.

pub mod cache;
pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod mutation;
