//! Core of the bot API client: streaming decoder, entity registry, envelope
//! reader and the long-polling update loop.
//!
//! This crate does no I/O of its own. The network sits behind the
//! [`ports::BotTransport`] port, implemented over HTTP in `ftb-http`.

pub mod api;
pub mod config;
pub mod decode;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod logging;
pub mod polling;
pub mod ports;
pub mod throttled;
pub mod types;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
