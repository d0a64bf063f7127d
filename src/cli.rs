use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Intake - fill in and manage dynamic application forms
#[derive(Parser, Debug, Clone)]
#[command(name = "intake", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "INTAKE_CONFIG", default_value = "intake.toml")]
    pub config: PathBuf,

    /// Backend base URL
    #[arg(long, env = "INTAKE_BASE_URL")]
    pub base_url: Option<String>,

    /// Bearer token for authenticated requests
    #[arg(long, env = "INTAKE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "INTAKE_TIMEOUT")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the field type registry
    FieldTypes,

    /// Print a form with the resolved kind of every field
    Show { form_id: i64 },

    /// Fill in and submit a form
    Submit {
        form_id: i64,

        /// Text value as FIELD_ID=TEXT (repeatable)
        #[arg(long = "value", value_parser = parse_key_value)]
        values: Vec<(String, String)>,

        /// Tick a checkbox field (repeatable)
        #[arg(long = "check")]
        checks: Vec<String>,

        /// Attach a file as FIELD_ID=PATH (repeatable)
        #[arg(long = "file", value_parser = parse_key_path)]
        files: Vec<(String, PathBuf)>,
    },

    /// Validate a schema draft (JSON or YAML) without creating it
    CheckSchema { path: PathBuf },

    /// Validate and create a form from a schema draft
    CreateForm { path: PathBuf },

    /// List applications received for a form
    Applications {
        form_id: i64,

        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Save a file uploaded with an application
    Download {
        application_id: i64,
        field_id: String,

        /// Output path; defaults to the uploaded file name
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD_ID=VALUE, got '{}'", s)),
    }
}

fn parse_key_path(s: &str) -> Result<(String, PathBuf), String> {
    parse_key_value(s).map(|(key, path)| (key, PathBuf::from(path)))
}
