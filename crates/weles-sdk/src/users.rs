//! User account commands.

use log::info;

use weles_core::{RequestBuilder, Transport, WelesResult};

use crate::client::{require_non_empty, RegistryClient};
use crate::credentials::Credentials;

impl<T: Transport> RegistryClient<T> {
    /// Register a new user. Returns the server's message verbatim.
    pub fn create_user(&self, credentials: &Credentials, mail: &str) -> WelesResult<String> {
        credentials.validate()?;
        require_non_empty("mail", mail)?;

        let request = RequestBuilder::post("users/create_user")
            .field("user_name", credentials.user_name.as_str())
            .field("password", credentials.password.as_str())
            .field("mail", mail)
            .build();
        let response = self.dispatch(request)?;
        info!(
            "Create user '{}' answered with status {}",
            credentials.user_name, response.status
        );
        Ok(response.body)
    }
}
