//! Core types and the transaction ledger for the Armoury inventory.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::LedgerStore`]; every other layer talks to a
//! [`ledger::Ledger`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod retry;
pub mod store;
pub mod transaction;
pub mod views;

pub use error::{Error, Result};
