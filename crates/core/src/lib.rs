//! We Rise Core - Donor registry domain types.
//!
//! This crate provides the types shared by the donation backend:
//! - `server` - HTTP service that confirms donations and records donors
//! - `integration-tests` - End-to-end tests driving the server in-process
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no file access, no
//! mail transport, no HTTP. The registry upsert algorithm lives here so it can
//! be tested without touching the disk.
//!
//! # Modules
//!
//! - [`types`] - Email, soulmark, donor and registry types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
