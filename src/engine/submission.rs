//! Submission payload: serialized values plus field-tagged files.

use serde::{Deserialize, Serialize};

use super::values::{FileHandle, FileMap, FormValues};
use crate::domain::FormResult;

/// Separator between field id and filename in the default tagging scheme
pub const DEFAULT_SEPARATOR: &str = "___";

/// Multipart part carrying the serialized values
pub const FORM_DATA_PART: &str = "form_data";

/// Multipart part name shared by files under filename tagging
pub const FILES_PART: &str = "files";

/// How a file's owning field travels on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FileTagging {
    /// Every file goes in the `files` part as `"{field_id}{separator}{name}"`.
    FilenamePrefix { separator: String },
    /// Each file gets its own `files.{field_id}` part and keeps its name.
    PartName,
}

impl Default for FileTagging {
    fn default() -> Self {
        FileTagging::FilenamePrefix {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl FileTagging {
    /// `(part name, file name)` for a file owned by `field_id`
    pub fn encode(&self, field_id: &str, file_name: &str) -> (String, String) {
        match self {
            FileTagging::FilenamePrefix { separator } => (
                FILES_PART.to_string(),
                format!("{}{}{}", field_id, separator, file_name),
            ),
            FileTagging::PartName => (format!("{}.{}", FILES_PART, field_id), file_name.to_string()),
        }
    }

    /// Recover `(field_id, file name)` from a received part
    pub fn decode<'a>(&self, part_name: &'a str, file_name: &'a str) -> Option<(&'a str, &'a str)> {
        match self {
            FileTagging::FilenamePrefix { separator } => {
                if part_name != FILES_PART {
                    return None;
                }
                split_tagged_filename(file_name, separator)
            }
            FileTagging::PartName => {
                let field_id = part_name.strip_prefix(FILES_PART)?.strip_prefix('.')?;
                if field_id.is_empty() {
                    None
                } else {
                    Some((field_id, file_name))
                }
            }
        }
    }
}

/// Split `"{field_id}{separator}{name}"` at the first separator.
///
/// A separator inside the original filename stays in the name part; one
/// inside the field id cannot be told apart.
pub fn split_tagged_filename<'a>(tagged: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    if separator.is_empty() {
        return None;
    }
    let (field_id, name) = tagged.split_once(separator)?;
    if field_id.is_empty() {
        None
    } else {
        Some((field_id, name))
    }
}

/// A file paired with the field that owns it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedFile {
    pub field_id: String,
    pub file: FileHandle,
}

/// Everything sent to the backend for one completed application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionPayload {
    /// JSON object of all non-file values, keyed by field id
    pub form_data: String,
    /// Selected files in schema order; unselected file fields are omitted
    pub files: Vec<TaggedFile>,
}

impl SubmissionPayload {
    pub fn build(values: &FormValues, files: &FileMap) -> FormResult<Self> {
        let form_data = values.to_json()?;
        let files = files
            .selected()
            .map(|(field_id, file)| TaggedFile {
                field_id: field_id.to_string(),
                file: file.clone(),
            })
            .collect();
        Ok(Self { form_data, files })
    }

    pub fn file_for(&self, field_id: &str) -> Option<&FileHandle> {
        self.files
            .iter()
            .find(|t| t.field_id == field_id)
            .map(|t| &t.file)
    }
}
