//! File output beyond the record store.

pub mod export;
