//! Integration tests for the We Rise donation server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p we-rise-integration-tests
//! ```
//!
//! The tests drive the server's router in-process with a capturing mail
//! transport and a registry file in a temporary directory. No SMTP server or
//! network access is needed.
//!
//! # Test Categories
//!
//! - `donation_api` - Donation confirmation endpoint and health checks
