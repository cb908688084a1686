//! Test fixtures for lote-router.
//!
//! Provides a realistic stop table around a collection point south of Salta
//! plus helpers to build the registry and mock directions providers.

pub mod salta_lotes;

pub use salta_lotes::*;
