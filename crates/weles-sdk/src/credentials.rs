//! User credentials.
//!
//! Commands take [`Credentials`] as plain values. Where they come from (a
//! terminal prompt, the environment, a secrets store) is the business of a
//! [`CredentialSource`].

use std::fmt;

use weles_core::{WelesError, WelesResult};

pub const ENV_USER: &str = "WELES_USER";
pub const ENV_PASSWORD: &str = "WELES_PASSWORD";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    pub(crate) fn validate(&self) -> WelesResult<()> {
        if self.user_name.trim().is_empty() {
            return Err(WelesError::invalid("user name must not be empty"));
        }
        Ok(())
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .finish()
    }
}

/// Supplies credentials on demand.
pub trait CredentialSource {
    fn credentials(&self) -> WelesResult<Credentials>;
}

/// Fixed credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialSource for StaticCredentials {
    fn credentials(&self) -> WelesResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Credentials read from `WELES_USER` and `WELES_PASSWORD`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credentials(&self) -> WelesResult<Credentials> {
        let user = std::env::var(ENV_USER)
            .map_err(|_| WelesError::invalid(format!("{} is not set", ENV_USER)))?;
        let password = std::env::var(ENV_PASSWORD)
            .map_err(|_| WelesError::invalid(format!("{} is not set", ENV_PASSWORD)))?;
        Ok(Credentials::new(user, password))
    }
}
