use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub mod validator;

use crate::cli::Cli;
use crate::engine::session::{FileAcceptPolicy, SessionOptions};
use crate::engine::submission::{FileTagging, DEFAULT_SEPARATOR};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub submission: SubmissionSettings,
    pub upload: UploadSettings,
    pub renderer: RendererSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// How files are tagged with their owning field in a submission
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaggingMode {
    FilenamePrefix,
    PartName,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SubmissionSettings {
    pub tagging: TaggingMode,
    /// Only used by `filename_prefix`
    pub separator: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadSettings {
    pub policy: FileAcceptPolicy,
}

/// Where field kinds come from when rendering a form
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KindResolution {
    /// Look types up in the fetched field type registry
    Registry,
    /// Fixed id table, no registry fetch
    Static,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RendererSettings {
    pub resolution: KindResolution,
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, env vars, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    /// Load `intake.toml` (or `intake.yaml`, `intake.json`) from `root`
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let settings = Self::load(&Path::new(root).join("intake"))?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .set_default("api.base_url", "http://localhost:8000")?
            .set_default("api.timeout_seconds", 30)?
            .set_default("submission.tagging", "filename_prefix")?
            .set_default("submission.separator", DEFAULT_SEPARATOR)?
            .set_default("upload.policy", "any")?
            .set_default("renderer.resolution", "registry")?
            .add_source(File::from(config_path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("INTAKE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Apply CLI argument overrides to settings
    pub fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.api.timeout_seconds = timeout;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn file_tagging(&self) -> FileTagging {
        match self.submission.tagging {
            TaggingMode::FilenamePrefix => FileTagging::FilenamePrefix {
                separator: self.submission.separator.clone(),
            },
            TaggingMode::PartName => FileTagging::PartName,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            accept_policy: self.upload.policy,
            submit_timeout: self.timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_root(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.api.timeout_seconds, 30);
        assert_eq!(settings.file_tagging(), FileTagging::default());
        assert_eq!(settings.upload.policy, FileAcceptPolicy::Any);
        assert_eq!(settings.renderer.resolution, KindResolution::Registry);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"http://forms.internal\"\ntimeout_seconds = 10\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "intake",
            "--config",
            path.to_str().unwrap(),
            "--timeout",
            "3",
            "field-types",
        ]);
        let settings = Settings::new_with_cli(&cli).unwrap();
        assert_eq!(settings.api.base_url, "http://forms.internal");
        assert_eq!(settings.timeout(), Duration::from_secs(3));
        assert_eq!(settings.session_options().submit_timeout, Duration::from_secs(3));
    }
}
