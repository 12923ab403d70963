//! `shopcore-auth` — authentication-token boundary.
//!
//! Token issuance and real validation live outside this system; the core
//! only consumes verdicts. This crate defines the seam plus a
//! deterministic in-memory validator for tests and embedding demos.

pub mod validator;

pub use validator::{StaticTokenValidator, TokenValidator, TokenVerdict, TokenWindow};
