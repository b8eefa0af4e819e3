//! # careops-adapter-email-smtp
//!
//! Outbound email over SMTP with STARTTLS, using
//! [lettre](https://docs.rs/lettre).
//!
//! Without credentials, or with a configuration that does not parse, the
//! sender stays inert and reports every message as skipped, so a development
//! setup runs without a mail server.

mod error;
mod sender;

pub use error::SmtpError;
pub use sender::{Config, SmtpEmailSender};
