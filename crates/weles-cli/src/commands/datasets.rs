//! `weles dataset ...`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::PathBuf;
use weles_sdk::{CredentialSource, Input, RegistryClient, DEFAULT_HEAD_ROWS};

use super::utils::{print_fields, print_table};

#[derive(Subcommand)]
pub enum DatasetCommand {
    /// Upload a CSV file (header row required)
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Name shown in the registry
        #[arg(short, long)]
        name: String,

        /// Description text, or a path to a file holding it
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Print a whole dataset
    Get {
        #[arg(value_name = "HASH")]
        dataset_id: String,
    },
    /// Print the first rows of a dataset
    Head {
        #[arg(value_name = "HASH")]
        dataset_id: String,

        #[arg(short, long, default_value_t = DEFAULT_HEAD_ROWS)]
        n: usize,
    },
    /// Print dataset metadata
    Info {
        #[arg(value_name = "HASH")]
        dataset_id: String,
    },
}

pub fn run(
    client: &RegistryClient,
    credentials: &dyn CredentialSource,
    command: DatasetCommand,
) -> Result<()> {
    match command {
        DatasetCommand::Upload {
            file,
            name,
            description,
        } => {
            let creds = credentials.credentials()?;
            let message = client
                .upload_dataset(Input::path(&file), &name, &description, &creds)
                .with_context(|| format!("Failed to upload '{}'", file.display()))?;
            println!("{} {}", "✓".green(), message);
            Ok(())
        }
        DatasetCommand::Get { dataset_id } => {
            let table = client
                .dataset(&dataset_id)
                .context(format!("Failed to get dataset '{}'", dataset_id))?;
            print_table(&dataset_id, &table);
            Ok(())
        }
        DatasetCommand::Head { dataset_id, n } => {
            let table = client
                .dataset_head(&dataset_id, n)
                .context(format!("Failed to get head of dataset '{}'", dataset_id))?;
            print_table(&format!("{} (first {})", dataset_id, n), &table);
            Ok(())
        }
        DatasetCommand::Info { dataset_id } => {
            let info = client
                .dataset_info(&dataset_id)
                .context(format!("Failed to get info for dataset '{}'", dataset_id))?;
            println!("📋 Dataset: {}", dataset_id.cyan().bold());
            print_fields(&info.fields);
            println!();
            print_table("Columns", &info.columns);
            Ok(())
        }
    }
}
