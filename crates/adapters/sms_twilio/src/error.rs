use careops_domain::error::CareOpsError;

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twilio rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<TwilioError> for CareOpsError {
    fn from(err: TwilioError) -> Self {
        Self::Storage(Box::new(err))
    }
}
