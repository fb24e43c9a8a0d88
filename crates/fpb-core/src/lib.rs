//! Core domain + application logic for the finance planner bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging port
//! (implemented in `fpb-telegram`); storage lives behind [`store::RecordSource`].

pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod keyboards;
pub mod listing;
pub mod logging;
pub mod messaging;
pub mod pagination;
pub mod search;
pub mod security;
pub mod session;
pub mod stats;
pub mod store;
pub mod validation;

pub use errors::{Error, Result};
