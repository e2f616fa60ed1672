//! `weles user ...`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use weles_sdk::{CredentialSource, RegistryClient};

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a new user with the given credentials
    Create {
        #[arg(short, long)]
        mail: String,
    },
}

pub fn run(
    client: &RegistryClient,
    credentials: &dyn CredentialSource,
    command: UserCommand,
) -> Result<()> {
    match command {
        UserCommand::Create { mail } => {
            let creds = credentials.credentials()?;
            let message = client
                .create_user(&creds, &mail)
                .context("Failed to create user")?;
            println!("{} {}", "✓".green(), message);
            Ok(())
        }
    }
}
