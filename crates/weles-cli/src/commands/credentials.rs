//! Terminal credential prompt.

use std::io::{self, BufRead, Write};

use weles_sdk::{CredentialSource, Credentials, WelesError, WelesResult};

/// Uses values given on the command line or in the environment and asks on
/// the terminal for whatever is missing.
pub struct PromptCredentials {
    user: Option<String>,
    password: Option<String>,
}

impl PromptCredentials {
    pub fn new(user: Option<String>, password: Option<String>) -> Self {
        Self { user, password }
    }
}

impl CredentialSource for PromptCredentials {
    fn credentials(&self) -> WelesResult<Credentials> {
        let user = match &self.user {
            Some(user) => user.clone(),
            None => prompt("user: ")?,
        };
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt("password: ")?,
        };
        Ok(Credentials::new(user, password))
    }
}

fn prompt(label: &str) -> WelesResult<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", label)?;
    stderr.flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(WelesError::invalid(format!(
            "no input for '{}'",
            label.trim_end_matches([':', ' '])
        )));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
