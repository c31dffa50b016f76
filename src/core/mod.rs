//! Engine, records and shared helpers.

pub mod engine;
pub mod error;
pub mod hash;
pub mod output;
pub mod signal;
pub mod store;
pub mod time;
