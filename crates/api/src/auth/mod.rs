//! Authentication primitives.
//!
//! Tokens are issued by the organisation's identity provider; this service
//! only validates them. [`jwt::generate_access_token`] exists for operators
//! and tests.

pub mod jwt;
