//! `weles model ...`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::PathBuf;
use weles_sdk::{
    AuditRequest, CredentialSource, Input, ModelUpload, PredictOptions, PredictionType,
    RegistryClient, SearchQuery, TagMatch, UploadOutcome,
};

use super::utils::{format_value, print_fields, print_table, split_list};

#[derive(Subcommand)]
pub enum ModelCommand {
    /// Upload a serialized model with its training data and requirements
    Upload {
        /// Serialized model file
        #[arg(value_name = "MODEL_FILE")]
        model: PathBuf,

        /// Name shown in the registry (letters, digits and '_')
        #[arg(short, long)]
        name: String,

        /// Target column of the training dataset
        #[arg(short, long)]
        target: String,

        /// Training dataset: a dataset hash or a CSV path containing '/'
        #[arg(long, value_name = "HASH|PATH")]
        train: String,

        /// Name of a newly uploaded training dataset
        #[arg(long, default_value = "")]
        train_name: String,

        /// Optional test dataset: a dataset hash or a CSV path containing '/'
        #[arg(long, value_name = "HASH|PATH")]
        test: Option<String>,

        /// Requirements file
        #[arg(short, long, value_name = "FILE")]
        requirements: PathBuf,

        /// Model description text, or a path to a file holding it
        #[arg(short, long, default_value = "")]
        description: String,

        /// Training dataset description text, or a path to a file holding it
        #[arg(long, default_value = "")]
        dataset_description: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Run a hosted model
    Predict {
        #[arg(value_name = "MODEL")]
        model_name: String,

        /// Dataset hash, or a CSV path containing '/'
        #[arg(value_name = "HASH|PATH")]
        data: String,

        /// exact or prob
        #[arg(long = "type", value_name = "TYPE")]
        prediction_type: Option<PredictionType>,
    },
    /// Print model metadata
    Info {
        #[arg(value_name = "MODEL")]
        model_name: String,
    },
    /// Print the requirements recorded for a model
    Requirements {
        #[arg(value_name = "MODEL")]
        model_name: String,
    },
    /// Search the registry
    Search {
        #[arg(long)]
        language: Option<String>,

        /// Version range, e.g. ">3.5;<3.7;"
        #[arg(long, allow_hyphen_values = true)]
        language_version: Option<String>,

        /// Row count range of the training dataset, e.g. ">100;<200;"
        #[arg(long, allow_hyphen_values = true)]
        row: Option<String>,

        /// Column count range of the training dataset
        #[arg(long, allow_hyphen_values = true)]
        column: Option<String>,

        /// Missing value count range of the training dataset
        #[arg(long, allow_hyphen_values = true)]
        missing: Option<String>,

        /// Class count range of the training dataset
        #[arg(long, allow_hyphen_values = true)]
        classes: Option<String>,

        #[arg(long)]
        owner: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// any or all
        #[arg(long)]
        tags_mode: Option<TagMatch>,

        /// Regular expression over model names
        #[arg(long)]
        regex: Option<String>,
    },
    /// Audit a model on a dataset
    Audit {
        #[arg(value_name = "MODEL")]
        model_name: String,

        /// Measure name, e.g. acc or mse
        #[arg(short, long)]
        measure: String,

        /// Target column
        #[arg(short, long)]
        target: String,

        /// Dataset hash, or a CSV path containing '/'
        #[arg(value_name = "HASH|PATH")]
        data: String,

        #[arg(long)]
        data_name: Option<String>,

        #[arg(long)]
        data_desc: Option<String>,
    },
}

pub fn run(
    client: &RegistryClient,
    credentials: &dyn CredentialSource,
    command: ModelCommand,
) -> Result<()> {
    match command {
        ModelCommand::Upload {
            model,
            name,
            target,
            train,
            train_name,
            test,
            requirements,
            description,
            dataset_description,
            tags,
        } => {
            let creds = credentials.credentials()?;
            let mut upload = ModelUpload::new(
                Input::<()>::path(&model),
                name.as_str(),
                target,
                Input::infer(&train),
                Input::path(&requirements),
                creds,
            )
            .with_description(description)
            .with_train_dataset_name(train_name)
            .with_dataset_description(dataset_description)
            .with_tags(split_list(&tags));
            if let Some(test) = test {
                upload = upload.with_test_dataset(Input::infer(&test));
            }

            let outcome = client
                .upload_model(upload)
                .with_context(|| format!("Failed to upload model '{}'", name))?;
            match outcome {
                UploadOutcome::Submitted(message) => println!("{} {}", "✓".green(), message),
                UploadOutcome::NameRejected(message) => println!("{} {}", "✗".red(), message),
            }
            Ok(())
        }
        ModelCommand::Predict {
            model_name,
            data,
            prediction_type,
        } => {
            let mut options = PredictOptions::default();
            if let Some(prediction_type) = prediction_type {
                options = options.prediction_type(prediction_type);
            }
            let result = client
                .predict(&model_name, Input::infer(&data), options)
                .with_context(|| format!("Failed to predict with '{}'", model_name))?;
            print_table("Predictions", &result);
            Ok(())
        }
        ModelCommand::Info { model_name } => {
            let info = client
                .model_info(&model_name)
                .context(format!("Failed to get model '{}'", model_name))?;

            println!("📋 Model: {}", model_name.cyan().bold());
            println!("{}", "=".repeat(60));
            print_fields(&info.model);
            if !info.data.is_empty() {
                println!();
                println!("{}", "Training data".cyan().bold());
                print_fields(&info.data);
            }
            println!();
            print_table("Columns", &info.columns);
            println!();
            print_table("Audits", &info.audits);
            Ok(())
        }
        ModelCommand::Requirements { model_name } => {
            let requirements = client
                .model_requirements(&model_name)
                .context(format!("Failed to get requirements of '{}'", model_name))?;
            match requirements.as_object() {
                Some(map) => {
                    for (package, version) in map {
                        println!("  {} {}", package.bright_green(), format_value(version));
                    }
                }
                None => println!("{}", serde_json::to_string_pretty(&requirements)?),
            }
            Ok(())
        }
        ModelCommand::Search {
            language,
            language_version,
            row,
            column,
            missing,
            classes,
            owner,
            tags,
            tags_mode,
            regex,
        } => {
            let mut query = SearchQuery::new();
            query.language = language;
            query.owner = owner;
            query.regex = regex;
            query.tags = tags.as_deref().map(split_list).unwrap_or_default();
            query.tags_mode = tags_mode;
            if let Some(raw) = language_version {
                query.language_version = raw.parse().context("Invalid --language-version")?;
            }
            if let Some(raw) = row {
                query.row = raw.parse().context("Invalid --row")?;
            }
            if let Some(raw) = column {
                query.column = raw.parse().context("Invalid --column")?;
            }
            if let Some(raw) = missing {
                query.missing = raw.parse().context("Invalid --missing")?;
            }
            if let Some(raw) = classes {
                query.classes = raw.parse().context("Invalid --classes")?;
            }

            let models = client
                .search_models(&query)
                .context("Failed to search models")?;
            for model in &models {
                println!("  {} {}", "•".bright_cyan(), model.cyan().bold());
            }
            println!("Found: {} models", models.len());
            Ok(())
        }
        ModelCommand::Audit {
            model_name,
            measure,
            target,
            data,
            data_name,
            data_desc,
        } => {
            let creds = credentials.credentials()?;
            let mut audit =
                AuditRequest::new(model_name.as_str(), measure.as_str(), target, Input::infer(&data), creds);
            audit.data_name = data_name;
            audit.data_desc = data_desc;

            let result = client
                .audit_model(audit)
                .with_context(|| format!("Failed to audit '{}' with '{}'", model_name, measure))?;
            print_table(&format!("{} on {}", measure, model_name), &result);
            Ok(())
        }
    }
}
