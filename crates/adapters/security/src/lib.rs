//! # careops-adapter-security
//!
//! Credential adapter: argon2 password hashes and HS256 JSON Web Tokens.
//!
//! ## Dependency rule
//! Depends on `careops-app` (for the `Credentials` port) and
//! `careops-domain`. Nothing else in the workspace depends on how tokens or
//! hashes are produced.

mod credentials;
mod error;

pub use credentials::{Claims, Config, JwtCredentials};
pub use error::SecurityError;
