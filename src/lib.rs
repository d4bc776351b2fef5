//! Digital twin of a small solar-plus-battery installation.
//!
//! Records flow through [`pipeline`] (forecast, classify, decide) and the
//! [`dispatch`] simulator answers what-if questions about battery size,
//! panel expansion and load reduction.

pub mod classify;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod io;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod synth;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "tui")]
pub mod tui;

pub use error::{Result, TwinError};
