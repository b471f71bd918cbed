//! Kago Core - Cart types and pure cart logic.
//!
//! This crate provides the types and pure functions shared by the Kago
//! cart components:
//! - `cart` - Authoritative store, persistence, and optimistic controller
//! - `cli` - Command-line composition root
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no async
//! runtime, no storage backends. Everything here can be evaluated against a
//! snapshot without side effects, which is what lets the optimistic controller
//! re-derive speculative state on every read.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers and prices
//! - [`cart`] - Line items, the cart collection, actions, projection, and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::*;
pub use types::*;
