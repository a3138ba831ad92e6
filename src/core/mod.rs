//! Core exchange logic

pub mod exchange;

pub use exchange::{ExchangeEngine, ExchangeError, Outcome};
