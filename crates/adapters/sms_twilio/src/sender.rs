//! [`SmsSender`] posting to `{api_base}/2010-04-01/Accounts/{sid}/Messages.json`.

use serde::Deserialize;

use careops_app::ports::SmsSender;
use careops_domain::notification::{Delivery, SmsMessage};

use crate::error::TwilioError;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    /// Overrides [`DEFAULT_API_BASE`].
    pub api_base: Option<String>,
}

struct Account {
    sid: String,
    auth_token: String,
    from_number: String,
    messages_url: String,
}

pub struct TwilioSmsSender {
    client: reqwest::Client,
    account: Option<Account>,
}

#[derive(Deserialize)]
struct Created {
    sid: String,
}

#[derive(Deserialize)]
struct Rejection {
    message: String,
}

impl TwilioSmsSender {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let account = match (config.account_sid, config.auth_token, config.from_number) {
            (Some(sid), Some(auth_token), Some(from_number)) => {
                let api_base = config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
                let messages_url = format!(
                    "{}/2010-04-01/Accounts/{sid}/Messages.json",
                    api_base.trim_end_matches('/')
                );
                Some(Account {
                    sid,
                    auth_token,
                    from_number,
                    messages_url,
                })
            }
            _ => {
                tracing::warn!("Twilio credentials not configured, SMS will be skipped");
                None
            }
        };
        Self {
            client: reqwest::Client::new(),
            account,
        }
    }

    async fn post(&self, account: &Account, sms: &SmsMessage) -> Result<String, TwilioError> {
        let response = self
            .client
            .post(&account.messages_url)
            .basic_auth(&account.sid, Some(&account.auth_token))
            .form(&[
                ("To", sms.to.as_str()),
                ("From", account.from_number.as_str()),
                ("Body", sms.body.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Rejection>()
                .await
                .map_or_else(|_| "no details".to_string(), |r| r.message);
            return Err(TwilioError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<Created>().await?.sid)
    }
}

impl SmsSender for TwilioSmsSender {
    async fn send_sms(&self, sms: SmsMessage) -> Delivery {
        let Some(account) = &self.account else {
            return Delivery::skipped("Twilio credentials not configured");
        };
        match self.post(account, &sms).await {
            Ok(sid) => Delivery::Sent { reference: sid },
            Err(err) => Delivery::failed(err),
        }
    }
}
