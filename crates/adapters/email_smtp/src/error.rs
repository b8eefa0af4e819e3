use careops_domain::error::CareOpsError;

#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

impl From<SmtpError> for CareOpsError {
    fn from(err: SmtpError) -> Self {
        Self::Storage(Box::new(err))
    }
}
