//! Jamaica We Rise donation confirmation server library.
//!
//! Receives verified donations from the payment flow, emails the donor a
//! confirmation and records the donation in a flat-file donor registry.
//! A support inbox poller runs alongside on its own timer.
//!
//! This crate provides the server functionality as a library, allowing it to
//! be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod registry;
pub mod routes;
pub mod services;
pub mod state;
pub mod workflow;
