//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session-bound access/refresh token issuing and resolution.

pub mod jwt;
pub mod password;
