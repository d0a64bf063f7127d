use thiserror::Error;

use crate::config::{ApiSettings, Settings, SubmissionSettings, TaggingMode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_api(&settings.api) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_submission(&settings.submission) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_api(api: &ApiSettings) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        let base_url = api.base_url.trim();
        if base_url.is_empty() {
            errors.push(ConfigError::MissingField("api.base_url".to_string()));
        } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: format!("'{}' must start with http:// or https://", base_url),
            });
        }

        if api.timeout_seconds == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "api.timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_submission(submission: &SubmissionSettings) -> Result<(), Vec<ConfigError>> {
        if submission.tagging == TaggingMode::FilenamePrefix && submission.separator.is_empty() {
            return Err(vec![ConfigError::InvalidValue {
                field: "submission.separator".to_string(),
                reason: "Separator must not be empty for filename_prefix tagging".to_string(),
            }]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KindResolution, RendererSettings, UploadSettings};
    use crate::engine::session::FileAcceptPolicy;

    fn settings() -> Settings {
        Settings {
            api: ApiSettings {
                base_url: "http://localhost:8000".into(),
                timeout_seconds: 30,
            },
            submission: SubmissionSettings {
                tagging: TaggingMode::FilenamePrefix,
                separator: "___".into(),
            },
            upload: UploadSettings {
                policy: FileAcceptPolicy::Any,
            },
            renderer: RendererSettings {
                resolution: KindResolution::Static,
            },
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(ConfigValidator::validate(&settings()).is_ok());
    }

    #[test]
    fn test_errors_accumulate() {
        let mut s = settings();
        s.api.base_url = "ftp://files".into();
        s.api.timeout_seconds = 0;
        s.submission.separator = String::new();

        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().contains("api.base_url"));
    }

    #[test]
    fn test_empty_base_url() {
        let mut s = settings();
        s.api.base_url = "  ".into();
        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert_eq!(errors, vec![ConfigError::MissingField("api.base_url".into())]);
    }

    #[test]
    fn test_separator_ignored_for_part_name() {
        let mut s = settings();
        s.submission.tagging = TaggingMode::PartName;
        s.submission.separator = String::new();
        assert!(ConfigValidator::validate(&s).is_ok());
    }
}
