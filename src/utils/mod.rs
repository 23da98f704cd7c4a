//! Utility modules: logger setup, query traces, numeric helpers.
pub mod logger;
pub mod num;
pub mod trace;
