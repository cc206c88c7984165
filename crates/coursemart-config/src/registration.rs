use std::env;

use crate::parse_list;

/// Sign-up policy.
///
/// Accounts registered with an email listed in `TRUSTED_SELLER_EMAILS` start
/// out as sellers; everyone else starts as a buyer.
#[derive(Clone, Debug, Default)]
pub struct RegistrationConfig {
    pub trusted_seller_emails: Vec<String>,
}

impl RegistrationConfig {
    pub fn from_env() -> Self {
        let raw = env::var("TRUSTED_SELLER_EMAILS").unwrap_or_default();
        Self::with_trusted_sellers(parse_list(&raw))
    }

    pub fn with_trusted_sellers(emails: Vec<String>) -> Self {
        Self {
            trusted_seller_emails: emails.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn is_trusted_seller(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.trusted_seller_emails.iter().any(|e| *e == email)
    }
}
