//! # careops-adapter-sms-twilio
//!
//! Outbound SMS through the Twilio Messages API.
//!
//! The sender is inert (every message skipped) until an account SID, auth
//! token and sending number are all configured.

mod error;
mod sender;

pub use error::TwilioError;
pub use sender::{Config, DEFAULT_API_BASE, TwilioSmsSender};
